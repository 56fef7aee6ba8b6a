//! Command error taxonomy shared by the registry, the handler factory and the
//! dispatcher.

use thiserror::Error;

/// Errors surfaced to the caller of a command, or to the registration code.
///
/// Nothing here is retried internally. Registration-time variants
/// (`Duplicate`, `InvalidDescriptor`) are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("invalid params for {command}: {reason}")]
    Validation { command: String, reason: String },

    #[error("command not found: {namespace}.{name}")]
    NotFound { namespace: String, name: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("command already registered: {namespace}.{name}")]
    Duplicate { namespace: String, name: String },

    #[error("invalid command definition {command}: {reason}")]
    InvalidDescriptor { command: String, reason: String },

    #[error("SiYuan API error {code}: {msg}")]
    Backend { code: i64, msg: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl CommandError {
    pub fn not_found(namespace: &str, name: &str) -> Self {
        Self::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Stable machine-readable error kind, used in tool error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::Validation { .. } => "validation_error",
            CommandError::NotFound { .. } | CommandError::UnknownTool(_) => "command_not_found",
            CommandError::Duplicate { .. } => "duplicate_command",
            CommandError::InvalidDescriptor { .. } => "invalid_descriptor",
            CommandError::Backend { .. } => "backend_error",
            CommandError::Transport(_) => "transport_error",
        }
    }

    /// Backend-provided error code, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            CommandError::Backend { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Map a reqwest failure onto `Transport` with a readable message.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let message = if err.is_connect() {
            "Cannot connect to SiYuan. Is it running?".to_string()
        } else if err.is_timeout() {
            "Request timed out".to_string()
        } else {
            format!("HTTP request failed: {}", err)
        };
        Self::Transport(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_code() {
        let err = CommandError::Backend {
            code: 1,
            msg: "error".into(),
        };
        assert_eq!(err.kind(), "backend_error");
        assert_eq!(err.code(), Some(1));

        let err = CommandError::Transport("refused".into());
        assert_eq!(err.kind(), "transport_error");
        assert_eq!(err.code(), None);

        assert_eq!(
            CommandError::UnknownTool("x_y".into()).kind(),
            CommandError::not_found("x", "y").kind()
        );
    }

    #[test]
    fn test_display() {
        let err = CommandError::not_found("system", "getVersion");
        assert_eq!(err.to_string(), "command not found: system.getVersion");

        let err = CommandError::Backend {
            code: -1,
            msg: "invalid token".into(),
        };
        assert_eq!(err.to_string(), "SiYuan API error -1: invalid token");
    }
}
