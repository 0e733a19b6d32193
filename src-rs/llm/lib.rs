pub mod anthropic_adapter;
pub mod openai_adapter;
pub mod rotation;
pub mod router;
pub(crate) mod transport;
pub mod types;

pub use anthropic_adapter::{AnthropicAdapter, AnthropicConfig};
pub use openai_adapter::{OpenAIAdapter, OpenAIConfig};
pub use rotation::Rotator;
pub use router::LLMRouter;
pub use types::{
    CompletionRequest, ContentBlock, ImageSource, LLMResponse, Message, ModelContent, ProviderAdapter,
    ProviderError, Role, ToolCall,
};
