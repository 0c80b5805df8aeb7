//! Supported-language catalog types and the source/target admissibility check.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Short provider language identifier, e.g. "en" or "ru".
pub type LanguageCode = String;

/// A language the provider can translate from or to.
///
/// Identity is the code alone; the display name is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedLanguage {
    #[serde(rename = "language")]
    pub code: LanguageCode,
    #[serde(rename = "name", default)]
    pub display_name: String,
}

impl SupportedLanguage {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
        }
    }
}

impl PartialEq for SupportedLanguage {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for SupportedLanguage {}

impl Hash for SupportedLanguage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

/// The set of languages the provider currently supports.
pub type Catalog = HashSet<SupportedLanguage>;

/// Which side of a translation request a language code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageRole {
    Source,
    Target,
}

impl std::fmt::Display for LanguageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageRole::Source => write!(f, "source"),
            LanguageRole::Target => write!(f, "target"),
        }
    }
}

/// Exact, case-sensitive membership test by code.
pub fn is_supported(code: &str, catalog: &Catalog) -> bool {
    catalog.iter().any(|language| language.code == code)
}

/// Check both codes against the catalog, source first.
pub fn validate_pair(source: &str, target: &str, catalog: &Catalog) -> Result<()> {
    if !is_supported(source, catalog) {
        return Err(RelayError::LanguageNotFound {
            which: LanguageRole::Source,
            code: source.to_string(),
        });
    }
    if !is_supported(target, catalog) {
        return Err(RelayError::LanguageNotFound {
            which: LanguageRole::Target,
            code: target.to_string(),
        });
    }
    Ok(())
}
