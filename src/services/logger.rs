use std::fs;
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Default filter when `RUST_LOG` is unset. reqwest/hyper internals are noisy.
const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn";

/// Initialize the structured logging system.
///
/// Sets up:
/// - Console output on stderr (stdout carries JSON-RPC and must stay clean).
/// - Optional file output: rolling log files in `{log_dir}/siyuan-mcp.log`
///   with daily rotation, keeping the latest 5 files.
/// - Environment filter: `RUST_LOG`, else `level`, else [`DEFAULT_FILTER`].
///
/// Fails if a global subscriber is already installed or the log directory
/// cannot be used.
pub fn init(log_dir: Option<&Path>, level: Option<&str>) -> anyhow::Result<()> {
    build_subscriber(log_dir, level)?.try_init()?;

    if let Some(dir) = log_dir {
        tracing::info!(log_dir = %dir.display(), "Logger initialized");
    }
    Ok(())
}

/// Assemble the layered subscriber without installing it.
fn build_subscriber(
    log_dir: Option<&Path>,
    level: Option<&str>,
) -> anyhow::Result<impl Subscriber + Send + Sync + 'static> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .compact();

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("siyuan-mcp")
                .filename_suffix("log")
                .max_log_files(5)
                .build(dir)?;
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .boxed(),
            )
        }
        None => None,
    };

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer))
}
