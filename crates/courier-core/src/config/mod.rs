mod defaults;


use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::RelayError;
use defaults::*;

/// Top-level Courier configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub courier: CourierConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub phone: PhoneConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    /// Application display name used in OTP messages.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for rolling log files. Empty = stdout only.
    #[serde(default)]
    pub log_dir: String,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

/// Backend application endpoints and shared secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Application server base URL (also hosts the secondary verify endpoint).
    #[serde(default = "default_app_url")]
    pub app_url: String,
    /// Backend API base URL. Empty = `{app_url}/api`.
    #[serde(default)]
    pub api_url: String,
    /// Shared secret sent and expected in the `x-internal-key` header.
    /// Empty = every dispatch request is rejected.
    #[serde(default)]
    pub internal_key: String,
    /// Purchase link sent in reply to `buy`. Empty = `{app_url}/pricing`.
    #[serde(default)]
    pub purchase_url: String,
    /// Per-request timeout for backend calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            app_url: default_app_url(),
            api_url: String::new(),
            internal_key: String::new(),
            purchase_url: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Application base URL without trailing slash.
    pub fn app_base(&self) -> String {
        self.app_url.trim_end_matches('/').to_string()
    }

    /// Backend API base URL without trailing slash.
    pub fn api_base(&self) -> String {
        if self.api_url.trim().is_empty() {
            format!("{}/api", self.app_base())
        } else {
            self.api_url.trim().trim_end_matches('/').to_string()
        }
    }

    pub fn purchase_link(&self) -> String {
        if self.purchase_url.trim().is_empty() {
            format!("{}/pricing", self.app_base())
        } else {
            self.purchase_url.trim().to_string()
        }
    }
}

/// Phone normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneConfig {
    /// Country code prepended to numbers submitted without one.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
    /// Numbers with at most this many digits are treated as local.
    #[serde(default = "default_local_max_digits")]
    pub local_max_digits: usize,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            default_country_code: default_country_code(),
            local_max_digits: default_local_max_digits(),
        }
    }
}

/// HTTP API listen address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

/// WhatsApp channel config.
///
/// Session data is stored at `{data_dir}/whatsapp_session/`. A disabled
/// channel never connects and reports `Disconnected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Apply environment overrides through `lookup` (usually `std::env::var`).
    ///
    /// Empty values are ignored. Unparsable numbers are logged and skipped.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("APP_NAME") {
            self.courier.name = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.courier.log_level = v;
        }
        if let Some(v) = get("LOG_DIR") {
            self.courier.log_dir = v;
        }
        if let Some(v) = get("DATA_DIR") {
            self.courier.data_dir = v;
        }
        if let Some(v) = get("APP_URL") {
            self.backend.app_url = v;
        }
        if let Some(v) = get("API_URL") {
            self.backend.api_url = v;
        }
        if let Some(v) = get("INTERNAL_API_KEY") {
            self.backend.internal_key = v;
        }
        if let Some(v) = get("PURCHASE_URL") {
            self.backend.purchase_url = v;
        }
        if let Some(v) = get("BACKEND_TIMEOUT_SECS") {
            match v.trim().parse() {
                Ok(secs) => self.backend.request_timeout_secs = secs,
                Err(e) => warn!("ignoring BACKEND_TIMEOUT_SECS={v}: {e}"),
            }
        }
        if let Some(v) = get("DEFAULT_COUNTRY_CODE") {
            self.phone.default_country_code = v;
        }
        if let Some(v) = get("HOST") {
            self.api.host = v;
        }
        if let Some(v) = get("PORT") {
            match v.trim().parse() {
                Ok(port) => self.api.port = port,
                Err(e) => warn!("ignoring PORT={v}: {e}"),
            }
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, RelayError> {
    let path = Path::new(path);
    if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| RelayError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| RelayError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
