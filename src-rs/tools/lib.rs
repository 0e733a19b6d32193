pub mod fact_check;
pub(crate) mod http;
pub mod news;
pub mod registry;
pub mod search;
pub mod types;
pub mod vision;

pub use fact_check::FactCheckTool;
pub use news::NewsTool;
pub use registry::ToolRegistry;
pub use search::SearchTool;
pub use types::{
    handler_fn, ParamType, RegistryError, ToolArgs, ToolDescriptor, ToolError, ToolHandler, ToolKind, ToolParam,
    ToolResult, ToolSchema, TOOL_FAILURE_MARKER,
};
pub use vision::DescribeImageTool;
