//! Process configuration, loaded once at start and never mutated.
//!
//! Each setting comes from the environment, falling back to a secret file
//! under `/run/secrets/`. The five backend settings are validated against
//! empty and placeholder values; what happens on failure depends on the
//! deployment environment (see [`check_startup`]).

use std::{env, fmt, fs::read_to_string};

use baas_client::Collection;
use thiserror::Error;
use tracing::{info, warn};

pub const ENDPOINT: &str = "BACKEND_ENDPOINT";
pub const PROJECT_ID: &str = "BACKEND_PROJECT_ID";
pub const API_KEY: &str = "BACKEND_API_KEY";
pub const DATABASE_ID: &str = "BACKEND_DATABASE_ID";
pub const COLLECTION_ID: &str = "BACKEND_COLLECTION_ID";
pub const APP_ENV: &str = "APP_ENV";
pub const PORT: &str = "PORT";

const DEFAULT_PORT: u16 = 3000;
const SECRETS_DIR: &str = "/run/secrets";

const PLACEHOLDERS: [&str; 6] = [
    "YOUR_ENDPOINT_HERE",
    "YOUR_PROJECT_ID_HERE",
    "YOUR_API_KEY_HERE",
    "YOUR_DATABASE_ID_HERE",
    "YOUR_COLLECTION_ID_HERE",
    "changeme",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing or placeholder settings: {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Immutable configuration snapshot.
#[derive(Clone)]
pub struct Config {
    pub environment: Environment,
    pub port: u16,
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub database_id: String,
    pub collection_id: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("port", &self.port)
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("collection_id", &self.collection_id)
            .finish()
    }
}

impl Config {
    /// Load from the process environment and `/run/secrets`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(env_or_secret)
    }

    /// Load through an arbitrary key lookup. Missing backend settings are
    /// kept as empty strings and reported by [`Config::validate`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let port = match lookup(PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: PORT,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => {
                info!("{PORT} not set, using default: {DEFAULT_PORT}");
                DEFAULT_PORT
            }
        };

        Ok(Self {
            environment: Environment::parse(lookup(APP_ENV).as_deref()),
            port,
            endpoint: setting(ENDPOINT),
            project_id: setting(PROJECT_ID),
            api_key: setting(API_KEY),
            database_id: setting(DATABASE_ID),
            collection_id: setting(COLLECTION_ID),
        })
    }

    fn backend_settings(&self) -> [(&'static str, &str); 5] {
        [
            (ENDPOINT, self.endpoint.as_str()),
            (PROJECT_ID, self.project_id.as_str()),
            (API_KEY, self.api_key.as_str()),
            (DATABASE_ID, self.database_id.as_str()),
            (COLLECTION_ID, self.collection_id.as_str()),
        ]
    }

    /// Names of the backend settings that are empty or placeholders.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        self.backend_settings()
            .into_iter()
            .filter(|(_, value)| is_unset(value))
            .map(|(key, _)| key)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_keys().is_empty()
    }

    /// Log every missing or placeholder setting by name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.missing_keys();
        if missing.is_empty() {
            return Ok(());
        }
        for key in &missing {
            warn!("{key} is missing or still a placeholder");
        }
        Err(ConfigError::Incomplete(missing))
    }

    pub fn collection(&self) -> Collection {
        Collection::new(&self.database_id, &self.collection_id)
    }
}

/// Fatal in production, a warning anywhere else.
pub fn check_startup(config: &Config) -> Result<(), ConfigError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(e) if config.environment.is_production() => Err(e),
        Err(e) => {
            warn!("{e}; backend calls will fail until this is fixed");
            Ok(())
        }
    }
}

/// Empty, whitespace-only, a known placeholder, or an `<angle-bracketed>` token.
pub fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || PLACEHOLDERS.iter().any(|p| value.eq_ignore_ascii_case(p))
        || (value.starts_with('<') && value.ends_with('>'))
}

fn env_or_secret(key: &str) -> Option<String> {
    if let Ok(value) = env::var(key) {
        return Some(value);
    }
    let path = format!("{SECRETS_DIR}/{key}");
    read_to_string(&path).ok().map(|s| s.trim().to_string())
}
