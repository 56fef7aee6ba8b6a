use serde::{Deserialize, Serialize};

use crate::mcp::client::RequestStyle;
use crate::mcp::dispatch::AccessPolicy;

/// Root configuration (`config.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub siyuan: SiyuanConfig,
    #[serde(default)]
    pub access: AccessPolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection to the SiYuan kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiyuanConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub request_style: RequestStyle,
}

impl Default for SiyuanConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            request_style: RequestStyle::default(),
        }
    }
}

/// Log output settings. Console logs always go to stderr.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub file: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default)]
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: true,
            level: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:6806".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
