use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::llm::ModelContent;
use crate::result::{AgentOutcome, AgentResult};

/// Body of every `/stream` reply. Failures travel in-band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactCheckResponse {
    Output {
        output: String,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

impl FactCheckResponse {
    pub fn output(text: impl Into<String>) -> Self {
        Self::Output { output: text.into() }
    }

    pub fn error(message: impl Into<String>, kind: &str) -> Self {
        Self::Error {
            error: message.into(),
            kind: Some(kind.to_string()),
        }
    }
}

impl From<ValidationError> for FactCheckResponse {
    // Validation errors keep the bare `{"error": ...}` shape older clients match on.
    fn from(err: ValidationError) -> Self {
        Self::Error {
            error: err.to_string(),
            kind: None,
        }
    }
}

/// Plain text of a model answer, whichever shape the provider used.
pub fn extract_text(content: &ModelContent) -> String {
    match content {
        ModelContent::Text(text) => text.trim().to_string(),
        ModelContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| block.text.as_deref())
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_default(),
    }
}

pub fn format_result(result: &AgentResult) -> FactCheckResponse {
    match &result.outcome {
        AgentOutcome::Done(content) => {
            let text = extract_text(content);
            if text.is_empty() {
                FactCheckResponse::error("model returned an empty answer", "model_error")
            } else {
                FactCheckResponse::output(text)
            }
        }
        AgentOutcome::Failed(err) => FactCheckResponse::error(err.to_string(), err.kind()),
    }
}
