pub mod rapidapi;

pub use rapidapi::RapidApiClient;

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::language::Catalog;
use async_trait::async_trait;

/// An external translation service consumed one word at a time.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Fetch the current catalog. Never cached.
    async fn fetch_supported_languages(&self) -> Result<Catalog>;

    /// Translate a single word with exactly one remote call.
    async fn translate_word(&self, word: &str, source: &str, target: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Build the HTTP provider described by `config`.
pub fn create_provider(config: &Config) -> Result<Box<dyn TranslationProvider>> {
    let api_key = config.api_key.as_ref().ok_or_else(|| {
        RelayError::Config(
            "Translation API key not set. Set LINGUA_API_KEY environment variable.".to_string(),
        )
    })?;

    Ok(Box::new(
        RapidApiClient::new(api_key.clone())
            .with_host(config.api_host.clone())
            .with_catalog_url(config.catalog_url.clone())
            .with_translate_url(config.translate_url.clone())
            .with_shape(config.response_shape)
            .with_timeout(config.request_timeout()),
    ))
}
