use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::llm::ToolCall;

/// Prefix of every tool result that reports a failure instead of data.
pub const TOOL_FAILURE_MARKER: &str = "[tool error]";

/// The closed set of capabilities the model may call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Search,
    CheckFact,
    CheckNews,
    DescribeImage,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Search,
        ToolKind::CheckFact,
        ToolKind::CheckNews,
        ToolKind::DescribeImage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::CheckFact => "check_fact",
            Self::CheckNews => "check_news",
            Self::DescribeImage => "describe_image",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
}

impl ParamType {
    fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_u64() || value.is_i64(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolParam {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub default: Option<Value>,
}

impl ToolParam {
    pub fn required(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamType, description: &str, default: Value) -> Self {
        Self {
            default: Some(default),
            ..Self::required(name, kind, description)
        }
    }
}

/// What the model sees of a tool: name, description and JSON Schema.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Arguments after validation: a JSON object with defaults filled in.
pub type ToolArgs = Map<String, Value>;

#[derive(Clone, Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("request to {service} failed: {message}")]
    Transport { service: &'static str, message: String },
    #[error("Failed to fetch data from {service}. Status code: {status}")]
    Status { service: &'static str, status: u16 },
    #[error("malformed response from {service}: {message}")]
    Malformed { service: &'static str, message: String },
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("model call failed: {0}")]
    Model(String),
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgs(_) => "invalid_args",
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
            Self::Timeout(_) => "timeout",
            Self::Model(_) => "model",
        }
    }
}

#[derive(Clone, Debug, Error)]
pub enum RegistryError {
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error(transparent)]
    Execution(#[from] ToolError),
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError>;
}

/// Adapts an async closure into a [`ToolHandler`].
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ToolError>> + Send,
{
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        (self.0)(args).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

pub struct ToolDescriptor {
    pub kind: ToolKind,
    pub description: String,
    pub params: Vec<ToolParam>,
    pub handler: Arc<dyn ToolHandler>,
    /// Overrides the registry-wide timeout for this tool.
    pub timeout: Option<Duration>,
}

impl ToolDescriptor {
    pub fn new(kind: ToolKind, description: &str, params: Vec<ToolParam>, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            kind,
            description: description.to_string(),
            params,
            handler,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn schema(&self) -> ToolSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            let mut prop = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            match &param.default {
                Some(default) => prop["default"] = default.clone(),
                None => required.push(json!(param.name)),
            }
            properties.insert(param.name.clone(), prop);
        }
        ToolSchema {
            name: self.name().to_string(),
            description: self.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    /// Checks `args` against the declared parameters and fills defaults.
    pub fn validate(&self, args: Value) -> Result<ToolArgs, ToolError> {
        let mut map = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::InvalidArgs(format!(
                    "expected a JSON object, got {}",
                    other
                )))
            }
        };
        for param in &self.params {
            match map.get(&param.name) {
                None | Some(Value::Null) => match &param.default {
                    Some(default) => {
                        map.insert(param.name.clone(), default.clone());
                    }
                    None => {
                        return Err(ToolError::InvalidArgs(format!(
                            "missing required argument `{}`",
                            param.name
                        )))
                    }
                },
                Some(value) if !param.kind.matches(value) => {
                    return Err(ToolError::InvalidArgs(format!(
                        "argument `{}` must be of type {}",
                        param.name,
                        param.kind.json_type()
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(map)
    }
}

/// Outcome of one tool call, rendered for the message history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub success: bool,
    pub output: String,
}

impl ToolResult {
    pub fn from_outcome(call: &ToolCall, outcome: Result<String, ToolError>) -> Self {
        let (success, output) = match outcome {
            Ok(text) => (true, text),
            Err(err) => (false, format!("{} {}: {}", TOOL_FAILURE_MARKER, call.name, err)),
        };
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            success,
            output,
        }
    }
}

pub fn arg_str<'a>(args: &'a ToolArgs, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArgs(format!("argument `{}` must be a string", name)))
}

pub fn arg_u64(args: &ToolArgs, name: &str) -> Result<u64, ToolError> {
    args.get(name)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| ToolError::InvalidArgs(format!("argument `{}` must be a non-negative integer", name)))
}
