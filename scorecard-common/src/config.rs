//! Settings loading and data folder resolution
//!
//! Every setting resolves through the same ladder, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable (`SCORECARD_*`)
//! 3. TOML config file (`~/.config/scorecard/config.toml`)
//! 4. Compiled default
//!
//! The caller-JWT secret has no compiled default: the service refuses to
//! start without one rather than booting with authentication disabled.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default bind address for the sheet-sync service
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";
/// Default port for the sheet-sync service
pub const DEFAULT_BIND_PORT: u16 = 5870;
/// Default base URL of the permission service (sibling module)
pub const DEFAULT_PERMISSIONS_URL: &str = "http://127.0.0.1:5871";
/// Default base URL of the Google Sheets REST API
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
/// Default rectangular range fetched from a tab
pub const DEFAULT_FETCH_RANGE: &str = "A1:Z1000";

/// Resolved runtime settings for the sheet-sync service
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Host the HTTP server binds to
    pub bind_host: String,
    /// Port the HTTP server binds to
    pub bind_port: u16,
    /// Data folder holding scorecard.db and default credential locations
    pub data_folder: PathBuf,
    /// Path to the Google service-account credential JSON
    pub service_account_path: PathBuf,
    /// Base URL of the permission service (capability checks)
    pub permission_service_url: String,
    /// HS256 secret used to verify caller bearer tokens
    pub caller_jwt_secret: String,
    /// Base URL of the Sheets REST API (overridable for tests)
    pub sheets_api_base: String,
    /// Token endpoint override; when None the credential file's token_uri is used
    pub token_url: Option<String>,
    /// A1 range fetched from each tab
    pub fetch_range: String,
    /// Ambiguous slash-date policy: true = MM/DD/YYYY, false = DD/MM/YYYY
    pub month_first: bool,
    /// Attempts for idempotent remote reads (1 = no retry)
    pub fetch_retry_attempts: u32,
    /// Initial backoff between read retries, doubled per attempt
    pub fetch_retry_base_ms: u64,
}

/// Command-line overrides fed into settings resolution
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub data_folder: Option<PathBuf>,
    pub bind_port: Option<u16>,
}

/// On-disk TOML shape; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub data_folder: Option<String>,
    pub bind_host: Option<String>,
    pub bind_port: Option<u16>,
    pub service_account_path: Option<String>,
    pub permission_service_url: Option<String>,
    pub caller_jwt_secret: Option<String>,
    pub sheets_api_base: Option<String>,
    pub token_url: Option<String>,
    pub fetch_range: Option<String>,
    pub month_first: Option<bool>,
    pub fetch_retry_attempts: Option<u32>,
    pub fetch_retry_base_ms: Option<u64>,
}

impl SyncSettings {
    /// Resolve settings through the CLI → env → TOML → default ladder
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let file = load_file_config(overrides.config_path.as_deref())?;

        let data_folder = overrides
            .data_folder
            .or_else(|| std::env::var("SCORECARD_DATA_FOLDER").ok().map(PathBuf::from))
            .or_else(|| file.data_folder.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_data_folder);

        let bind_host = env_string("SCORECARD_BIND_HOST")
            .or(file.bind_host.clone())
            .unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());

        let bind_port = overrides
            .bind_port
            .or_else(|| env_parse::<u16>("SCORECARD_BIND_PORT"))
            .or(file.bind_port)
            .unwrap_or(DEFAULT_BIND_PORT);

        let service_account_path = env_string("SCORECARD_SERVICE_ACCOUNT")
            .map(PathBuf::from)
            .or_else(|| file.service_account_path.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| data_folder.join("service-account.json"));

        let permission_service_url = env_string("SCORECARD_PERMISSIONS_URL")
            .or(file.permission_service_url.clone())
            .unwrap_or_else(|| DEFAULT_PERMISSIONS_URL.to_string());

        let caller_jwt_secret = resolve_jwt_secret(&file)?;

        let sheets_api_base = env_string("SCORECARD_SHEETS_API_BASE")
            .or(file.sheets_api_base.clone())
            .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string());

        let token_url = env_string("SCORECARD_TOKEN_URL").or(file.token_url.clone());

        let fetch_range = env_string("SCORECARD_FETCH_RANGE")
            .or(file.fetch_range.clone())
            .unwrap_or_else(|| DEFAULT_FETCH_RANGE.to_string());

        let month_first = env_parse::<bool>("SCORECARD_MONTH_FIRST")
            .or(file.month_first)
            .unwrap_or(true);

        let fetch_retry_attempts = env_parse::<u32>("SCORECARD_FETCH_RETRY_ATTEMPTS")
            .or(file.fetch_retry_attempts)
            .unwrap_or(3)
            .max(1);

        let fetch_retry_base_ms = env_parse::<u64>("SCORECARD_FETCH_RETRY_BASE_MS")
            .or(file.fetch_retry_base_ms)
            .unwrap_or(250);

        Ok(Self {
            bind_host,
            bind_port,
            data_folder,
            service_account_path,
            permission_service_url,
            caller_jwt_secret,
            sheets_api_base,
            token_url,
            fetch_range,
            month_first,
            fetch_retry_attempts,
            fetch_retry_base_ms,
        })
    }

    /// Path of the SQLite database inside the data folder
    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join("scorecard.db")
    }

    /// Bind address string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}

/// Load the TOML config file, if one exists
///
/// Priority: explicit CLI path → `SCORECARD_CONFIG` env → platform default.
/// A missing file is not an error (defaults apply); an unreadable or
/// unparsable file is.
fn load_file_config(cli_path: Option<&Path>) -> Result<FileConfig> {
    let path = cli_path
        .map(PathBuf::from)
        .or_else(|| std::env::var("SCORECARD_CONFIG").ok().map(PathBuf::from))
        .or_else(default_config_path);

    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    if !path.exists() {
        // Only the explicit paths are required to exist
        if cli_path.is_some() || std::env::var("SCORECARD_CONFIG").is_ok() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(FileConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config: FileConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Resolve the caller-JWT secret; warn when both tiers are set
fn resolve_jwt_secret(file: &FileConfig) -> Result<String> {
    let env_secret = env_string("SCORECARD_JWT_SECRET");
    let file_secret = file.caller_jwt_secret.clone();

    if env_secret.is_some() && file_secret.is_some() {
        warn!("Caller JWT secret set in both environment and config file; using environment");
    }

    env_secret.or(file_secret).ok_or_else(|| {
        Error::Config(
            "Caller JWT secret not configured. Set SCORECARD_JWT_SECRET or \
             caller_jwt_secret in the config file."
                .to_string(),
        )
    })
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Platform default config file path (`~/.config/scorecard/config.toml`)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scorecard").join("config.toml"))
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("scorecard"))
        .unwrap_or_else(|| PathBuf::from("./scorecard_data"))
}
