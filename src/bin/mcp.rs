//! Standalone MCP server binary for SiYuan.
//!
//! Spawned by an MCP client as a tool server; speaks JSON-RPC 2.0 on stdio and
//! forwards tool calls to the SiYuan kernel API over HTTP.
//!
//! Usage:
//! - `siyuan-mcp`                          -- serve on stdin/stdout
//! - `siyuan-mcp --export-docs`            -- print the command documentation as JSON
//! - `siyuan-mcp --export-docs=markdown`   -- same, as Markdown
//!
//! Configuration: see `siyuan_mcp_lib::config` (config.json + `SIYUAN_*` env vars).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use siyuan_mcp_lib::config::{self, paths};
use siyuan_mcp_lib::mcp::handlers::register_all;
use siyuan_mcp_lib::mcp::server::run_server;
use siyuan_mcp_lib::mcp::{Dispatcher, Registry, SiyuanClient};
use siyuan_mcp_lib::services::logger;

#[derive(Parser, Debug)]
#[command(name = "siyuan-mcp", version)]
#[command(about = "MCP tool server for the SiYuan kernel API")]
struct Cli {
    /// Print the command documentation and exit instead of serving
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "json")]
    export_docs: Option<DocsFormat>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DocsFormat {
    Json,
    #[value(alias = "md")]
    Markdown,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("[MCP] Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config()?;

    let log_dir = config.logging.file.then(paths::get_log_dir);
    if let Err(e) = logger::init(log_dir.as_deref(), config.logging.level.as_deref()) {
        eprintln!("[MCP] Logging setup failed: {:#}", e);
    }

    // Registration happens before serving; any failure aborts startup
    let mut registry = Registry::new();
    register_all(&mut registry).context("command registration failed")?;

    if let Some(format) = cli.export_docs {
        let tree = registry.export_documentation();
        let out = match format {
            DocsFormat::Json => serde_json::to_string_pretty(&tree)?,
            DocsFormat::Markdown => tree.to_markdown(),
        };
        println!("{}", out);
        return Ok(());
    }

    let client = SiyuanClient::new(
        &config.siyuan.base_url,
        config.siyuan.token.clone(),
        config.siyuan.request_style,
        Duration::from_secs(config.siyuan.timeout_secs),
    )?;
    info!(
        "[MCP] Forwarding to {} ({:?} access, {:?} requests)",
        config.siyuan.base_url, config.access, config.siyuan.request_style
    );

    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(client), config.access);
    run_server(dispatcher).await?;
    Ok(())
}
