//! Documentation tree exported for external documentation tooling.
//!
//! Never consulted on the dispatch path.

use std::fmt::Write as _;

use serde::Serialize;

use super::descriptor::{CommandDescriptor, Example, McpMode, ReturnShape};
use super::schema::ParamField;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentationTree {
    pub namespaces: Vec<NamespaceDocs>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceDocs {
    pub namespace: String,
    pub commands: Vec<CommandDocs>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDocs {
    pub name: String,
    pub tool_name: String,
    pub description: String,
    pub modes: Vec<McpMode>,
    pub params: Vec<ParamField>,
    pub returns: ReturnShape,
    pub examples: Vec<Example>,
    pub api_link: String,
}

impl CommandDocs {
    pub fn from_descriptor(descriptor: &CommandDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            tool_name: descriptor.tool_name(),
            description: descriptor.description.clone(),
            modes: descriptor.modes.clone(),
            params: descriptor.params.fields().to_vec(),
            returns: descriptor.documentation.returns.clone(),
            examples: descriptor.documentation.examples.clone(),
            api_link: descriptor.documentation.api_link.clone(),
        }
    }
}

impl DocumentationTree {
    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceDocs> {
        self.namespaces.iter().find(|ns| ns.namespace == namespace)
    }

    /// Render as Markdown: one section per namespace, one subsection per command.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# SiYuan MCP commands\n");

        for ns in &self.namespaces {
            let _ = write!(out, "\n## {}\n", ns.namespace);
            for cmd in &ns.commands {
                let modes: Vec<&str> = cmd.modes.iter().map(|m| m.as_str()).collect();
                let _ = write!(
                    out,
                    "\n### `{}`\n\n{}\n\n- Tool: `{}`\n- Mode: {}\n- API: {}\n",
                    cmd.name,
                    cmd.description,
                    cmd.tool_name,
                    modes.join(", "),
                    cmd.api_link
                );

                if cmd.params.is_empty() {
                    out.push_str("\nParameters: none\n");
                } else {
                    out.push_str("\n| Parameter | Type | Required | Description |\n");
                    out.push_str("|---|---|---|---|\n");
                    for p in &cmd.params {
                        let _ = writeln!(
                            out,
                            "| `{}` | {} | {} | {} |",
                            p.name,
                            p.ty.as_str(),
                            if p.required { "yes" } else { "no" },
                            p.description
                        );
                    }
                }

                let _ = write!(
                    out,
                    "\nReturns `{}`: {}\n",
                    cmd.returns.ty.as_str(),
                    cmd.returns.description
                );
                for (prop, desc) in &cmd.returns.properties {
                    let _ = writeln!(out, "- `{}`: {}", prop, desc);
                }

                for example in &cmd.examples {
                    let _ = write!(
                        out,
                        "\n{}\n\n```json\n// params\n{}\n// response\n{}\n```\n",
                        example.description,
                        serde_json::to_string_pretty(&example.params).unwrap_or_default(),
                        serde_json::to_string_pretty(&example.response).unwrap_or_default()
                    );
                }
            }
        }
        out
    }
}
