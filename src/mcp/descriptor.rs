//! Command descriptor: the declarative record describing one command.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::Transport;
use super::error::CommandError;
use super::schema::{ParamSchema, ParamType, ValidatedParams};

/// Namespaces and names must be plain identifiers so the MCP tool name
/// `namespace_name` splits unambiguously.
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("identifier regex is valid"));

/// Access-mode tag of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum McpMode {
    Read,
    Write,
}

impl McpMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
        }
    }
}

/// How the backend request is shaped, derived from the command's modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Read-only command.
    Read,
    /// Command declaring WRITE (state-mutating).
    Write,
}

impl RequestKind {
    pub fn for_modes(modes: &[McpMode]) -> Self {
        if modes.contains(&McpMode::Write) {
            Self::Write
        } else {
            Self::Read
        }
    }
}

/// Everything a handler receives for one invocation.
pub struct Invocation {
    pub transport: Arc<dyn Transport>,
    pub kind: RequestKind,
    pub params: ValidatedParams,
}

pub type HandlerFuture = BoxFuture<'static, Result<Value, CommandError>>;

/// Owned handler function: validated invocation in, result or error out.
pub type CommandHandler = Arc<dyn Fn(Invocation) -> HandlerFuture + Send + Sync>;

/// Shape of a successful result, for documentation only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnShape {
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub description: String,
    /// Property name -> description, in declaration order.
    #[serde(serialize_with = "serialize_properties")]
    pub properties: Vec<(String, String)>,
}

fn serialize_properties<S: serde::Serializer>(
    properties: &[(String, String)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(properties.iter().map(|(k, v)| (k, v)))
}

impl ReturnShape {
    pub fn object(description: &str, properties: &[(&str, &str)]) -> Self {
        Self {
            ty: ParamType::Object,
            description: description.to_string(),
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// One literal example invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    pub description: String,
    pub params: Value,
    pub response: Value,
}

/// Documentation block of a command. Parameter rows are derived from the
/// command's [`ParamSchema`] at export time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    pub returns: ReturnShape,
    pub examples: Vec<Example>,
    pub api_link: String,
}

/// Declarative record for one command.
#[derive(Clone)]
pub struct CommandDescriptor {
    pub namespace: String,
    pub name: String,
    pub description: String,
    pub params: ParamSchema,
    pub modes: Vec<McpMode>,
    pub handler: CommandHandler,
    pub documentation: Documentation,
}

impl CommandDescriptor {
    /// `namespace.name`, used in logs and errors.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// MCP-facing tool name.
    pub fn tool_name(&self) -> String {
        format!("{}_{}", self.namespace, self.name)
    }

    pub fn has_mode(&self, mode: McpMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Whether the mode set shares at least one tag with `filter`.
    pub fn matches_any(&self, filter: &[McpMode]) -> bool {
        self.modes.iter().any(|m| filter.contains(m))
    }

    pub fn request_kind(&self) -> RequestKind {
        RequestKind::for_modes(&self.modes)
    }

    /// Validate raw arguments against this command's schema.
    pub fn validate(&self, args: &Value) -> Result<ValidatedParams, CommandError> {
        self.params
            .validate(args)
            .map_err(|reason| CommandError::Validation {
                command: self.qualified_name(),
                reason,
            })
    }

    /// Definition-time checks run before registration.
    pub fn check_definition(&self) -> Result<(), CommandError> {
        let invalid = |reason: String| CommandError::InvalidDescriptor {
            command: self.qualified_name(),
            reason,
        };

        if !IDENT_RE.is_match(&self.namespace) {
            return Err(invalid(format!("bad namespace `{}`", self.namespace)));
        }
        if !IDENT_RE.is_match(&self.name) {
            return Err(invalid(format!("bad name `{}`", self.name)));
        }
        if self.description.trim().is_empty() {
            return Err(invalid("empty description".into()));
        }
        if self.modes.is_empty() {
            return Err(invalid("no access mode declared".into()));
        }
        self.params.check_well_formed().map_err(invalid)?;

        for (i, example) in self.documentation.examples.iter().enumerate() {
            self.params
                .validate(&example.params)
                .map_err(|reason| invalid(format!("example #{}: {}", i, reason)))?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("modes", &self.modes)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
