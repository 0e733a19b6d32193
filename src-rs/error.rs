use std::time::Duration;

use thiserror::Error;

use crate::llm::ProviderError;

/// Failures that end a reasoning loop. Tool failures never show up here;
/// they are folded into the history as text.
#[derive(Clone, Debug, Error)]
pub enum AgentError {
    #[error("model requested unknown tool `{0}`")]
    UnknownTool(String),
    #[error("no final answer after {0} turns")]
    LoopBudgetExceeded(usize),
    #[error("model error: {0}")]
    Model(#[from] ProviderError),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl AgentError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::LoopBudgetExceeded(_) => "loop_budget_exceeded",
            Self::Model(_) => "model_error",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Rejected request bodies. Reported in-band like every other failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No input provided")]
    NoInput,
    #[error("Invalid request body: {0}")]
    Malformed(String),
    #[error("Missing required field `{0}`")]
    MissingField(&'static str),
}
