//! Configuration reading: `config.json` plus environment overrides.
//!
//! Environment variables (take precedence over the file):
//! - `SIYUAN_API_URL`            -- kernel base URL
//! - `SIYUAN_TOKEN`              -- API token
//! - `SIYUAN_MCP_MODE`           -- `read` or `write`
//! - `SIYUAN_MCP_REQUEST_STYLE`  -- `by-mode` or `post-all`
//! - `SIYUAN_MCP_TIMEOUT_SECS`   -- request timeout
//! - `SIYUAN_MCP_LOG_FILE`       -- `0` disables the log file

pub mod paths;
pub mod schema;

use std::path::Path;

use anyhow::{bail, Context};

use crate::mcp::client::RequestStyle;
use crate::mcp::dispatch::AccessPolicy;

pub use schema::{AppConfig, LoggingConfig, SiyuanConfig};

/// Load the config file (defaults if absent), apply env overrides, validate.
pub fn load_config() -> anyhow::Result<AppConfig> {
    load_config_from(&paths::get_config_path(), |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit file and env source.
///
/// A missing file means defaults. A file that exists but cannot be read or
/// parsed is an error: falling back would drop settings such as `access`.
pub fn load_config_from<F>(path: &Path, lookup: F) -> anyhow::Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: AppConfig = read_json_file(path)?.unwrap_or_default();
    apply_env_overrides(&mut config, lookup)?;
    validate(&config)?;
    Ok(config)
}

/// Apply overrides from `lookup` (the process environment in production).
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup("SIYUAN_API_URL") {
        config.siyuan.base_url = url.trim().to_string();
    }
    if let Some(token) = lookup("SIYUAN_TOKEN") {
        config.siyuan.token = Some(token.trim().to_string());
    }
    if let Some(mode) = lookup("SIYUAN_MCP_MODE") {
        config.access = match AccessPolicy::parse(&mode) {
            Some(policy) => policy,
            None => bail!("SIYUAN_MCP_MODE must be `read` or `write`, got `{}`", mode),
        };
    }
    if let Some(style) = lookup("SIYUAN_MCP_REQUEST_STYLE") {
        config.siyuan.request_style = match RequestStyle::parse(&style) {
            Some(style) => style,
            None => bail!(
                "SIYUAN_MCP_REQUEST_STYLE must be `by-mode` or `post-all`, got `{}`",
                style
            ),
        };
    }
    if let Some(secs) = lookup("SIYUAN_MCP_TIMEOUT_SECS") {
        config.siyuan.timeout_secs = secs
            .trim()
            .parse()
            .with_context(|| format!("SIYUAN_MCP_TIMEOUT_SECS is not a number: `{}`", secs))?;
    }
    if let Some(flag) = lookup("SIYUAN_MCP_LOG_FILE") {
        config.logging.file = !matches!(flag.trim(), "0" | "false" | "off");
    }
    Ok(())
}

/// Reject settings the server cannot start with.
pub fn validate(config: &AppConfig) -> anyhow::Result<()> {
    let url = url::Url::parse(&config.siyuan.base_url)
        .with_context(|| format!("invalid SiYuan base URL `{}`", config.siyuan.base_url))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("SiYuan base URL must be http or https, got `{}`", url.scheme());
    }
    if config.siyuan.timeout_secs == 0 {
        bail!("request timeout must be at least 1 second");
    }
    Ok(())
}

/// Read a JSON file and deserialize it. `Ok(None)` when the file is absent.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read config {}", path.display()))
        }
    };
    let value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(Some(value))
}
