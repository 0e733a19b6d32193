use crate::formatter::extract_text;
use crate::llm::{CompletionRequest, LLMRouter, Message, ProviderError};

const QUOTE_PAIRS: [(char, char); 2] = [('"', '"'), ('\u{201c}', '\u{201d}')];

fn tweet_prompt(fact_check: &str, original_tweet: &str) -> String {
    format!(
        "Given the fact check below, create a short version for a tweet answering to the original tweet:\n\
         Original tweet: {}\n\
         Fact check: {}\n\
         Answer with only the text of the tweet. Sound as human as possible.",
        original_tweet, fact_check
    )
}

/// Drafts a reply tweet from a finished fact check. One model call, no tools.
pub async fn generate_tweet(
    router: &LLMRouter,
    model: &str,
    max_tokens: u32,
    fact_check: &str,
    original_tweet: &str,
) -> Result<String, ProviderError> {
    let request = CompletionRequest {
        messages: vec![Message::user(tweet_prompt(fact_check, original_tweet))],
        temperature: Some(0.0),
        model: Some(model.to_string()),
        max_tokens: Some(max_tokens),
        ..CompletionRequest::default()
    };
    let resp = router.complete(request).await?;
    Ok(strip_quotes(&extract_text(&resp.content)).to_string())
}

/// Removes one pair of wrapping quotes, if present.
pub fn strip_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in QUOTE_PAIRS {
        if trimmed.chars().count() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
            return &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
        }
    }
    trimmed
}
