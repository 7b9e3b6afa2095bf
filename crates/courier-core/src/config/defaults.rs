//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "Courier".to_string()
}

pub fn default_data_dir() -> String {
    "~/.courier".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

pub fn default_request_timeout_secs() -> u64 {
    15
}

pub fn default_country_code() -> String {
    "91".to_string()
}

pub fn default_local_max_digits() -> usize {
    10
}

pub fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_api_port() -> u16 {
    3001
}
