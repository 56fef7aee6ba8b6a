//! Platform-specific config and data directories.
//!
//!   Windows: %APPDATA%/siyuan-mcp
//!   macOS:   ~/Library/Application Support/siyuan-mcp
//!   Linux:   $XDG_CONFIG_HOME/siyuan-mcp (default ~/.config)

use std::path::PathBuf;

const APP_DIR: &str = "siyuan-mcp";

/// Directory holding `config.json` and `logs/`.
pub fn get_data_dir() -> PathBuf {
    get_config_base().join(APP_DIR)
}

/// Default config file path; `SIYUAN_MCP_CONFIG` overrides it.
pub fn get_config_path() -> PathBuf {
    std::env::var_os("SIYUAN_MCP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| get_data_dir().join("config.json"))
}

pub fn get_log_dir() -> PathBuf {
    get_data_dir().join("logs")
}

fn get_config_base() -> PathBuf {
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // Respect XDG_CONFIG_HOME, default ~/.config
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg);
        }
    }
    dirs::config_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_app_dir() {
        let data = get_data_dir();
        assert!(data.ends_with(APP_DIR));
        assert!(get_log_dir().starts_with(&data));
        assert!(get_log_dir().ends_with("logs"));
    }
}
