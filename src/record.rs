//! Translation history sinks.

use crate::error::{RelayError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// A completed translation, before the sink assigns identity and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTranslationRecord {
    pub caller_address: String,
    pub input_text: String,
    pub translated_text: String,
}

/// A stored translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: u64,
    pub caller_address: String,
    pub input_text: String,
    pub translated_text: String,
    pub created_at: NaiveDate,
}

impl TranslationRecord {
    fn from_new(id: u64, record: NewTranslationRecord) -> Self {
        Self {
            id,
            caller_address: record.caller_address,
            input_text: record.input_text,
            translated_text: record.translated_text,
            created_at: Utc::now().date_naive(),
        }
    }
}

/// Append-only storage for translation history.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn store(&self, record: NewTranslationRecord) -> Result<TranslationRecord>;
}

/// Keeps records in process memory.
#[derive(Debug, Default)]
pub struct MemoryRecordSink {
    records: Mutex<Vec<TranslationRecord>>,
}

impl MemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    // Records are only ever pushed whole, so a poisoned lock still guards a
    // consistent list.
    fn lock(&self) -> MutexGuard<'_, Vec<TranslationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of everything stored so far, oldest first.
    pub fn records(&self) -> Vec<TranslationRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSink for MemoryRecordSink {
    async fn store(&self, record: NewTranslationRecord) -> Result<TranslationRecord> {
        let mut records = self.lock();

        let stored = TranslationRecord::from_new(records.len() as u64 + 1, record);
        records.push(stored.clone());
        debug!("Stored translation record {}", stored.id);
        Ok(stored)
    }
}

/// Writes one JSON object per line, creating the file on first write.
pub struct JsonlRecordSink {
    path: PathBuf,
    next_id: tokio::sync::Mutex<u64>,
}

impl JsonlRecordSink {
    /// Open a sink at `path`. Ids continue after any records already in the file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents.lines().filter(|l| !l.trim().is_empty()).count() as u64,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        info!(
            "Recording translations to {:?} ({} existing records)",
            path, existing
        );

        Ok(Self {
            path,
            next_id: tokio::sync::Mutex::new(existing + 1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl RecordSink for JsonlRecordSink {
    async fn store(&self, record: NewTranslationRecord) -> Result<TranslationRecord> {
        // Held across the write so ids match line order.
        let mut next_id = self.next_id.lock().await;

        let stored = TranslationRecord::from_new(*next_id, record);
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        self.append(&line).await.map_err(|e| {
            RelayError::Storage(format!("{}: {}", self.path.display(), e))
        })?;

        *next_id += 1;
        debug!("Stored translation record {} in {:?}", stored.id, self.path);
        Ok(stored)
    }
}
