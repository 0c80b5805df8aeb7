//! Google Translate over RapidAPI.
//!
//! The same client serves both known response layouts; see [`ResponseShape`].

use crate::config::ResponseShape;
use crate::error::{RelayError, Result};
use crate::language::{Catalog, SupportedLanguage};
use crate::provider::TranslationProvider;
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_HOST: &str = "google-translator9.p.rapidapi.com";
const DEFAULT_CATALOG_URL: &str = "https://google-translator9.p.rapidapi.com/v2/languages";
const DEFAULT_TRANSLATE_URL: &str = "https://google-translator9.p.rapidapi.com/v2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the RapidAPI translation endpoints.
pub struct RapidApiClient {
    client: Client,
    api_key: String,
    api_host: String,
    catalog_url: String,
    translate_url: String,
    shape: ResponseShape,
    timeout: Duration,
}

impl RapidApiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_host: DEFAULT_HOST.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
            shape: ResponseShape::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the value sent in the `x-rapidapi-host` header.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = host.into();
        self
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    pub fn with_translate_url(mut self, url: impl Into<String>) -> Self {
        self.translate_url = url.into();
        self
    }

    pub fn with_shape(mut self, shape: ResponseShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn read_success_body(&self, response: reqwest::Response, what: &str) -> Result<String> {
        let status = response.status();
        debug!("{} response status: {}", what, status);

        let body = response.text().await.map_err(|e| {
            RelayError::ProviderAccess(format!("Failed to read {} response: {}", what, e))
        })?;

        if status.is_client_error() {
            return Err(RelayError::ProviderRejected {
                status: status.as_u16(),
                body,
            });
        }

        if !status.is_success() {
            return Err(RelayError::ProviderAccess(format!(
                "{} request failed ({}): {}",
                what, status, body
            )));
        }

        Ok(body)
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
}

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize, Debug)]
struct LanguagesBody {
    languages: Option<Vec<SupportedLanguage>>,
}

#[derive(Deserialize, Debug)]
struct TranslationsBody {
    translations: Option<Vec<TranslationEntry>>,
}

#[derive(Deserialize, Debug)]
struct TranslationEntry {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

fn unwrap_shape<T: DeserializeOwned>(body: &str, shape: ResponseShape) -> Result<T> {
    let malformed = |e: serde_json::Error| {
        RelayError::ProviderAccess(format!("Malformed provider response: {}", e))
    };

    match shape {
        ResponseShape::Nested => serde_json::from_str::<Envelope<T>>(body)
            .map_err(malformed)?
            .data
            .ok_or_else(|| {
                RelayError::ProviderAccess("Provider response has no \"data\" object".to_string())
            }),
        ResponseShape::Flat => serde_json::from_str::<T>(body).map_err(malformed),
    }
}

/// Parse a catalog response body.
pub(crate) fn parse_languages(body: &str, shape: ResponseShape) -> Result<Catalog> {
    let languages = unwrap_shape::<LanguagesBody>(body, shape)?
        .languages
        .ok_or_else(|| {
            RelayError::ProviderAccess("Provider response has no \"languages\" list".to_string())
        })?;

    Ok(languages.into_iter().collect())
}

/// Parse a word translation response body, returning the first entry's text.
pub(crate) fn parse_translation(body: &str, shape: ResponseShape) -> Result<String> {
    let text = unwrap_shape::<TranslationsBody>(body, shape)?
        .translations
        .and_then(|t| t.into_iter().next())
        .and_then(|entry| entry.translated_text)
        .ok_or_else(|| {
            RelayError::ProviderAccess(
                "Provider response has no translated text".to_string(),
            )
        })?;

    match shape {
        ResponseShape::Nested => decode_form_text(&text),
        ResponseShape::Flat => Ok(text),
    }
}

/// Decode `application/x-www-form-urlencoded` text: `+` is a space, `%XX` is a UTF-8 byte.
fn decode_form_text(text: &str) -> Result<String> {
    let spaced = text.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| RelayError::ProviderAccess(format!("Invalid percent-encoded text: {}", e)))
}

#[async_trait]
impl TranslationProvider for RapidApiClient {
    async fn fetch_supported_languages(&self) -> Result<Catalog> {
        debug!("Fetching supported languages from {}", self.catalog_url);

        let response = self
            .client
            .get(&self.catalog_url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .timeout(self.timeout)
            .send()
            .await?;

        let body = self.read_success_body(response, "Supported languages").await?;
        let catalog = parse_languages(&body, self.shape)?;

        debug!("Provider supports {} languages", catalog.len());
        Ok(catalog)
    }

    async fn translate_word(&self, word: &str, source: &str, target: &str) -> Result<String> {
        let request = TranslateRequest {
            q: word,
            source,
            target,
        };

        let response = self
            .client
            .post(&self.translate_url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let body = self.read_success_body(response, "Translation").await?;
        parse_translation(&body, self.shape)
    }

    fn name(&self) -> &'static str {
        "rapidapi"
    }
}
