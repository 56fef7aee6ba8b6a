//! Invocation path: lookup, access policy, validation, handler.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::client::Transport;
use super::descriptor::{CommandDescriptor, Invocation, McpMode};
use super::error::CommandError;
use super::registry::Registry;

/// Which commands a deployment exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessPolicy {
    /// Only commands tagged READ.
    ReadOnly,
    /// Every command.
    #[default]
    ReadWrite,
}

impl AccessPolicy {
    pub fn allowed_modes(&self) -> &'static [McpMode] {
        match self {
            Self::ReadOnly => &[McpMode::Read],
            Self::ReadWrite => &[McpMode::Read, McpMode::Write],
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "read" | "read-only" | "readonly" => Some(Self::ReadOnly),
            "write" | "read-write" | "readwrite" | "all" => Some(Self::ReadWrite),
            _ => None,
        }
    }
}

/// Shared entry point for executing commands.
///
/// Cheap to clone; the registry is read-only after startup.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    policy: AccessPolicy,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, transport: Arc<dyn Transport>, policy: AccessPolicy) -> Self {
        Self {
            registry,
            transport,
            policy,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// Commands visible under the access policy, in registration order.
    pub fn visible_commands(&self) -> Vec<&CommandDescriptor> {
        self.registry
            .list_commands(Some(self.policy.allowed_modes()))
    }

    /// Run `namespace.name` with raw `params`.
    pub async fn invoke(
        &self,
        namespace: &str,
        name: &str,
        params: &Value,
    ) -> Result<Value, CommandError> {
        let descriptor = self.registry.get_command(namespace, name)?;
        if !descriptor.matches_any(self.policy.allowed_modes()) {
            warn!(
                "[MCP] {} hidden by {:?} access policy",
                descriptor.qualified_name(),
                self.policy
            );
            return Err(CommandError::not_found(namespace, name));
        }
        self.run(descriptor, params).await
    }

    /// Run a command by its MCP tool name.
    pub async fn call_tool(&self, tool_name: &str, args: &Value) -> Result<Value, CommandError> {
        let descriptor = self
            .registry
            .find_tool(tool_name)
            .filter(|d| d.matches_any(self.policy.allowed_modes()))
            .ok_or_else(|| CommandError::UnknownTool(tool_name.to_string()))?;
        self.run(descriptor, args).await
    }

    async fn run(&self, descriptor: &CommandDescriptor, args: &Value) -> Result<Value, CommandError> {
        let params = descriptor.validate(args)?;
        info!("[MCP] Invoking {}", descriptor.qualified_name());

        let invocation = Invocation {
            transport: Arc::clone(&self.transport),
            kind: descriptor.request_kind(),
            params,
        };
        let result = (descriptor.handler)(invocation).await;
        if let Err(ref e) = result {
            warn!("[MCP] {} failed: {}", descriptor.qualified_name(), e);
        }
        result
    }
}
