use crate::error::AgentError;
use crate::llm::{Message, ModelContent};

/// How a reasoning loop ended.
#[derive(Clone, Debug)]
pub enum AgentOutcome {
    Done(ModelContent),
    Failed(AgentError),
}

/// Terminal value of one loop, with the history it produced.
#[derive(Clone, Debug)]
pub struct AgentResult {
    pub outcome: AgentOutcome,
    /// Model queries issued.
    pub turns: usize,
    pub history: Vec<Message>,
}

impl AgentResult {
    pub fn done(content: ModelContent, turns: usize, history: Vec<Message>) -> Self {
        Self {
            outcome: AgentOutcome::Done(content),
            turns,
            history,
        }
    }

    pub fn failed(err: AgentError, turns: usize, history: Vec<Message>) -> Self {
        Self {
            outcome: AgentOutcome::Failed(err),
            turns,
            history,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self.outcome, AgentOutcome::Done(_))
    }

    pub fn error(&self) -> Option<&AgentError> {
        match &self.outcome {
            AgentOutcome::Failed(err) => Some(err),
            AgentOutcome::Done(_) => None,
        }
    }

    /// Number of tool results recorded in the history.
    pub fn tool_results(&self) -> usize {
        self.history
            .iter()
            .filter(|msg| msg.tool_call_id.is_some())
            .count()
    }
}
