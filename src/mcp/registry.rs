//! Command registry.
//!
//! Built once at startup, populated by the command modules, then shared
//! read-only (`Arc<Registry>`) for the serving lifetime. Iteration order is
//! insertion order.

use std::collections::HashMap;

use tracing::info;

use super::descriptor::{CommandDescriptor, McpMode};
use super::docs::{CommandDocs, DocumentationTree, NamespaceDocs};
use super::error::CommandError;

#[derive(Debug, Default)]
pub struct Registry {
    commands: Vec<CommandDescriptor>,
    by_key: HashMap<(String, String), usize>,
    by_tool: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor keyed by `(namespace, name)`.
    ///
    /// Fails with `InvalidDescriptor` if the definition is malformed and with
    /// `Duplicate` if the key is taken. Never overwrites.
    pub fn register_command(&mut self, descriptor: CommandDescriptor) -> Result<(), CommandError> {
        descriptor.check_definition()?;

        let key = (descriptor.namespace.clone(), descriptor.name.clone());
        if self.by_key.contains_key(&key) {
            return Err(CommandError::Duplicate {
                namespace: key.0,
                name: key.1,
            });
        }

        let index = self.commands.len();
        info!(
            "[MCP] Registered command {} ({})",
            descriptor.qualified_name(),
            descriptor
                .modes
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        self.by_tool.insert(descriptor.tool_name(), index);
        self.by_key.insert(key, index);
        self.commands.push(descriptor);
        Ok(())
    }

    pub fn get_command(&self, namespace: &str, name: &str) -> Result<&CommandDescriptor, CommandError> {
        self.by_key
            .get(&(namespace.to_string(), name.to_string()))
            .map(|&i| &self.commands[i])
            .ok_or_else(|| CommandError::not_found(namespace, name))
    }

    /// Lookup by MCP tool name (`namespace_name`).
    pub fn find_tool(&self, tool_name: &str) -> Option<&CommandDescriptor> {
        self.by_tool.get(tool_name).map(|&i| &self.commands[i])
    }

    /// All descriptors, or those whose modes intersect `filter`.
    pub fn list_commands(&self, filter: Option<&[McpMode]>) -> Vec<&CommandDescriptor> {
        self.commands
            .iter()
            .filter(|d| filter.map_or(true, |f| d.matches_any(f)))
            .collect()
    }

    /// Group every descriptor's documentation by namespace.
    pub fn export_documentation(&self) -> DocumentationTree {
        let mut namespaces: Vec<NamespaceDocs> = Vec::new();
        for descriptor in &self.commands {
            let docs = CommandDocs::from_descriptor(descriptor);
            match namespaces
                .iter_mut()
                .find(|ns| ns.namespace == descriptor.namespace)
            {
                Some(ns) => ns.commands.push(docs),
                None => namespaces.push(NamespaceDocs {
                    namespace: descriptor.namespace.clone(),
                    commands: vec![docs],
                }),
            }
        }
        DocumentationTree { namespaces }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
