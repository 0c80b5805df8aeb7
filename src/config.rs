use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Layout of the provider's JSON responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// Collections wrapped in a top-level `data` object, text percent-encoded.
    #[default]
    Nested,
    /// Collections at the top level, text returned verbatim.
    Flat,
}

impl std::fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseShape::Nested => write!(f, "nested"),
            ResponseShape::Flat => write!(f, "flat"),
        }
    }
}

impl std::str::FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nested" => Ok(ResponseShape::Nested),
            "flat" => Ok(ResponseShape::Flat),
            _ => Err(format!(
                "Unknown response shape: {}. Use 'nested' or 'flat'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_host: String,
    pub catalog_url: String,
    pub translate_url: String,
    pub response_shape: ResponseShape,
    /// Upper bound on in-flight word translations across all requests.
    pub concurrency: usize,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub request_timeout_secs: u64,
    /// Limit per wave of `concurrency` words; 0 disables it.
    pub attempt_timeout_secs: u64,
    pub bind: String,
    /// Append-only record file; records are kept in memory when unset.
    pub records_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_host: "google-translator9.p.rapidapi.com".to_string(),
            catalog_url: "https://google-translator9.p.rapidapi.com/v2/languages".to_string(),
            translate_url: "https://google-translator9.p.rapidapi.com/v2".to_string(),
            response_shape: ResponseShape::default(),
            concurrency: 10,
            max_attempts: 5,
            initial_backoff_ms: 1000,
            request_timeout_secs: 10,
            attempt_timeout_secs: 60,
            bind: "127.0.0.1:8080".to_string(),
            records_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = toml::from_str::<Config>(&contents).map_err(|e| {
                    RelayError::Config(format!("{}: {}", config_path.display(), e))
                })?;
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Override fields from `LINGUA_*` variables resolved through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("LINGUA_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(host) = lookup("LINGUA_API_HOST") {
            self.api_host = host;
        }
        if let Some(url) = lookup("LINGUA_CATALOG_URL") {
            self.catalog_url = url;
        }
        if let Some(url) = lookup("LINGUA_TRANSLATE_URL") {
            self.translate_url = url;
        }
        if let Some(shape) = lookup("LINGUA_RESPONSE_SHAPE") {
            if let Ok(s) = shape.parse() {
                self.response_shape = s;
            }
        }
        if let Some(concurrency) = lookup("LINGUA_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                self.concurrency = c;
            }
        }
        if let Some(attempts) = lookup("LINGUA_MAX_ATTEMPTS") {
            if let Ok(a) = attempts.parse() {
                self.max_attempts = a;
            }
        }
        if let Some(timeout) = lookup("LINGUA_REQUEST_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.request_timeout_secs = t;
            }
        }
        if let Some(timeout) = lookup("LINGUA_ATTEMPT_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.attempt_timeout_secs = t;
            }
        }
        if let Some(backoff) = lookup("LINGUA_INITIAL_BACKOFF_MS") {
            if let Ok(b) = backoff.parse() {
                self.initial_backoff_ms = b;
            }
        }
        if let Some(bind) = lookup("LINGUA_BIND") {
            self.bind = bind;
        }
        if let Some(path) = lookup("LINGUA_RECORDS_PATH") {
            self.records_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(RelayError::Config(
                "LINGUA_API_KEY not set. Export it with: export LINGUA_API_KEY=...".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(RelayError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(RelayError::Config(
                "Max attempts must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(RelayError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lingua-relay").join("config.toml"))
    }
}
