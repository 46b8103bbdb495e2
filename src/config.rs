//! Environment-driven configuration

use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Where sessions are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    Sqlite(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub anthropic_api_key: String,
    pub llm_gateway: Option<String>,
    pub model: String,
    pub calendly_api_token: String,
    pub calendly_base_url: Option<String>,
    pub store: StoreLocation,
    pub port: u16,
    pub greet: bool,
    pub prompts_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let store = match get("ACME_DB_PATH").as_deref() {
            Some(":memory:") => StoreLocation::Memory,
            Some(path) => StoreLocation::Sqlite(PathBuf::from(path)),
            None => {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                StoreLocation::Sqlite(PathBuf::from(home).join(".acme-dental/sessions.db"))
            }
        };

        let port = match get("ACME_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "ACME_PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let greet = match get("ACME_GREET") {
            Some(value) => parse_flag(&value).ok_or(ConfigError::Invalid {
                name: "ACME_GREET",
                value,
            })?,
            None => true,
        };

        Ok(Self {
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            llm_gateway: get("LLM_GATEWAY"),
            model: get("ACME_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            calendly_api_token: require("CALENDLY_API_TOKEN")?,
            calendly_base_url: get("CALENDLY_BASE_URL"),
            store,
            port,
            greet,
            prompts_dir: get("ACME_PROMPTS_DIR").map(PathBuf::from),
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
