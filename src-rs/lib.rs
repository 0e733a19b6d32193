pub mod agent;
pub mod claim;
pub mod config;
pub mod error;
pub mod formatter;
pub mod helpers;
pub mod prompt;
pub mod result;
pub mod tweet;

#[path = "llm/lib.rs"]
pub mod llm;
#[path = "tools/lib.rs"]
pub mod tools;
#[path = "api/lib.rs"]
pub mod api;

pub use agent::Agent;
pub use claim::Claim;
pub use config::{AgentConfig, Config, ConfigError, ProviderKind, Settings};
pub use error::{AgentError, ValidationError};
pub use formatter::{format_result, FactCheckResponse};
pub use result::{AgentOutcome, AgentResult};
