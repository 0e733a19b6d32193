use chrono::NaiveDate;

/// Persona sent as the first message of every reasoning loop.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools to look up \
evidence before answering, and never invent sources.";

/// The four labels a verdict may open with.
pub const VERDICT_LABELS: [&str; 4] = ["True", "Partially True", "False", "Unverifiable"];

const IMAGE_ONLY_CLAIM: &str = "the claim made by the image";

/// Builds the task prompt for one claim. Pure: identical inputs give identical text.
pub fn build_prompt(claim_text: Option<&str>, reference_date: NaiveDate, image_url: Option<&str>) -> String {
    let claim = match claim_text {
        Some(text) => format!("\"{}\"", text.trim()),
        None => IMAGE_ONLY_CLAIM.to_string(),
    };
    let labels = VERDICT_LABELS
        .iter()
        .map(|label| format!("**{}**", label))
        .collect::<Vec<_>>()
        .join(", ");

    let body = format!(
        "You are a precise and concise fact-checker with knowledge up to {today}. Verify this claim:\n\
\n\
{claim}\n\
\n\
Respond with a single, well-formatted paragraph using Markdown and the following structure:\n\
\n\
1. Start with a bold verdict: {labels}.\n\
2. Follow with a concise explanation, including the correct information if the claim is false or needs context.\n\
3. End with a source citation, using a Markdown link if a URL is available.\n\
4. Don't ask questions if the claim is not verifiable. Simply explain why it cannot be fact-checked.\n\
\n\
Your response should be direct, concise, and flow naturally. Do not use bullet points or numbering.\n\
If the input is not a factual claim, simply explain why it cannot be fact-checked. \
If you're uncertain about any aspect, state this clearly.\n\
In stating if a fact is true, consider the main point of the claim and not just the literal interpretation. \
For example, if the claim is \"The sky is blue,\" the main point is that the sky is generally blue, \
not that it is blue at night or during a storm.\n\
Just correct the facts stated in the claim if necessary.\n\
If a claim is a mix of opinions and facts, focus on the factual aspects for the fact-check \
and return true or false based on those facts and not the opinions.\n\
When possible, use multiple sources to verify the claim.\n\
\n\
Format your response like this:\n\
**Verdict:** Explanation. [Source](URL) [Source](URL)\n\
\n\
If no URL is available, use this format:\n\
**Verdict:** Explanation. (Source: description)\n",
        today = reference_date.format("%Y-%m-%d"),
        claim = claim,
        labels = labels,
    );

    match image_url {
        Some(url) => format!("Considering the image here: {}. {}", url, body),
        None => body,
    }
}
