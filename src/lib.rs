pub mod config;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod pool;
pub mod provider;
pub mod record;
pub mod retry;
pub mod server;

pub use config::{Config, ResponseShape};
pub use error::{RelayError, Result};
pub use language::{is_supported, validate_pair, Catalog, LanguageRole, SupportedLanguage};
pub use orchestrator::{TranslationJob, TranslationOrchestrator};
pub use pool::WorkerPool;
pub use provider::{create_provider, TranslationProvider};
pub use record::{
    JsonlRecordSink, MemoryRecordSink, NewTranslationRecord, RecordSink, TranslationRecord,
};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
