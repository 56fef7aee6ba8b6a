//! MCP (Model Context Protocol) command bridge for the SiYuan kernel API.
//!
//! Exposes SiYuan REST endpoints as schema-validated MCP tools over a
//! JSON-RPC stdio server.
//!
//! Architecture:
//! - `schema.rs`     -- Parameter schema table and validator
//! - `descriptor.rs` -- Command descriptor record (identity, schema, mode, docs)
//! - `registry.rs`   -- Command registry (register, lookup, mode filter, docs export)
//! - `client.rs`     -- Handler factory and HTTP transport to the SiYuan kernel
//! - `dispatch.rs`   -- Invocation path: lookup, access policy, validation, handler
//! - `docs.rs`       -- Documentation tree for external doc tooling
//! - `server.rs`     -- JSON-RPC protocol handler (stdin/stdout)
//! - `handlers/`     -- Command modules (system, notification)

pub mod client;
pub mod descriptor;
pub mod dispatch;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod schema;
pub mod server;

pub use client::{create_handler, SiyuanClient, Transport};
pub use descriptor::{CommandDescriptor, Documentation, Example, McpMode, ReturnShape};
pub use dispatch::{AccessPolicy, Dispatcher};
pub use error::CommandError;
pub use registry::Registry;
pub use schema::{ParamSchema, ParamType, ValidatedParams};
