//! Command modules.
//!
//! Each module builds the descriptors for one SiYuan API namespace:
//! - `system`       -- Kernel info (boot progress, version, current time)
//! - `notification` -- Message and error notifications in the SiYuan UI

pub mod notification;
pub mod system;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::CommandError;
use super::registry::Registry;

/// Register every command module. A failure here must abort startup.
pub fn register_all(registry: &mut Registry) -> Result<(), CommandError> {
    system::register(registry)?;
    notification::register(registry)?;
    Ok(())
}

/// Result type returned for every `tools/call`.
///
/// Matches the MCP protocol's tool result format:
/// ```json
/// {
///   "content": [{ "type": "text", "text": "..." }],
///   "isError": false
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolResult {
    pub content: Vec<McpContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

/// A single content item in an MCP tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum McpContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl McpToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Successful command result, pretty-printed.
    pub fn from_value(result: &Value) -> Self {
        let text =
            serde_json::to_string_pretty(result).unwrap_or_else(|_| format!("{:?}", result));
        Self::text(text)
    }

    /// Failed command, as `{ success: false, kind, error, code? }`.
    pub fn from_error(err: &CommandError) -> Self {
        let mut payload = json!({
            "success": false,
            "kind": err.kind(),
            "error": err.to_string(),
        });
        if let Some(code) = err.code() {
            payload["code"] = json!(code);
        }
        let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| err.to_string());
        Self::error(text)
    }
}
