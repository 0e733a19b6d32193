use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::types::{RegistryError, ToolDescriptor, ToolError, ToolKind, ToolSchema};

/// Name → descriptor map. Built once at startup, then shared read-only.
pub struct ToolRegistry {
    tools: HashMap<ToolKind, ToolDescriptor>,
    timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if self.tools.contains_key(&descriptor.kind) {
            return Err(RegistryError::DuplicateTool(descriptor.name().to_string()));
        }
        self.tools.insert(descriptor.kind, descriptor);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&ToolDescriptor, RegistryError> {
        ToolKind::from_name(name)
            .and_then(|kind| self.tools.get(&kind))
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    /// Resolves `name` and runs the call.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<String, RegistryError> {
        let descriptor = self.resolve(name)?;
        Ok(self.run(descriptor, args).await?)
    }

    /// Validates and runs one call against an already resolved tool. Every
    /// failure, including the timeout, comes back as a [`ToolError`].
    pub async fn run(&self, descriptor: &ToolDescriptor, args: Value) -> Result<String, ToolError> {
        let args = descriptor.validate(args)?;
        let limit = descriptor.timeout.unwrap_or(self.timeout);
        debug!(tool = descriptor.name(), "invoking tool");
        match tokio::time::timeout(limit, descriptor.handler.call(args)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => {
                warn!(tool = descriptor.name(), kind = err.kind(), "tool failed: {}", err);
                Err(err)
            }
            Err(_) => {
                warn!(tool = descriptor.name(), "tool timed out");
                Err(ToolError::Timeout(limit))
            }
        }
    }

    /// Schemas in a stable order so provider payloads are deterministic.
    pub fn get_schemas(&self) -> Vec<ToolSchema> {
        ToolKind::ALL
            .iter()
            .filter_map(|kind| self.tools.get(kind))
            .map(ToolDescriptor::schema)
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }
}
