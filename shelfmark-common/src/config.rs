//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the root data folder
pub const ROOT_ENV_VAR: &str = "SHELFMARK_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "shelfmark.db";

/// Fallback listen address when the settings table has no override
pub const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";
pub const DEFAULT_LISTEN_PORT: u16 = 5780;

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. SHELFMARK_ROOT environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Database file path inside the resolved root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}

/// Locate the configuration file for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/shelfmark/config.toml first, then /etc/shelfmark/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("shelfmark").join("config.toml"));
        let system_config = PathBuf::from("/etc/shelfmark/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("shelfmark").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/shelfmark (or /var/lib/shelfmark for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("shelfmark"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/shelfmark"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("shelfmark"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/shelfmark"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("shelfmark"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\shelfmark"))
    } else {
        PathBuf::from("./shelfmark_data")
    }
}

/// Listen address from the settings table, falling back to compiled defaults
pub async fn load_listen_addr(db: &sqlx::SqlitePool) -> Result<(String, u16)> {
    let host: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'listen_host'")
            .fetch_optional(db)
            .await?;

    let port: Option<i64> = sqlx::query_scalar(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'listen_port'",
    )
    .fetch_optional(db)
    .await?;

    Ok((
        host.unwrap_or_else(|| DEFAULT_LISTEN_HOST.to_string()),
        port.map(|p| p as u16).unwrap_or(DEFAULT_LISTEN_PORT),
    ))
}
