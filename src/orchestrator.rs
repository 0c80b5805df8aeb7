use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::language::{validate_pair, Catalog, LanguageCode};
use crate::pool::WorkerPool;
use crate::provider::TranslationProvider;
use crate::record::{NewTranslationRecord, RecordSink};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Caller address used when the transport does not supply one.
pub const DEFAULT_CALLER_ADDRESS: &str = "127.0.0.1";

/// Longest accepted input, in characters.
pub const MAX_INPUT_CHARS: usize = 10_000;

/// One translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    pub input_text: String,
    pub source_language: LanguageCode,
    pub target_language: LanguageCode,
    pub caller_address: String,
}

impl TranslationJob {
    pub fn new(
        input_text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            input_text: input_text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            caller_address: DEFAULT_CALLER_ADDRESS.to_string(),
        }
    }

    pub fn with_caller(mut self, caller_address: impl Into<String>) -> Self {
        self.caller_address = caller_address.into();
        self
    }
}

/// A single word and its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTask {
    pub index: usize,
    pub word: String,
}

/// Stages of one translation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Validating,
    Dispatching,
    AwaitingAll,
    Joining,
    Persisting,
    Completed,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Validating => "validating",
            PipelineState::Dispatching => "dispatching",
            PipelineState::AwaitingAll => "awaiting",
            PipelineState::Joining => "joining",
            PipelineState::Persisting => "persisting",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Split on every single space. Consecutive spaces yield empty words.
pub fn split_words(text: &str) -> Vec<WordTask> {
    text.split(' ')
        .enumerate()
        .map(|(index, word)| WordTask {
            index,
            word: word.to_string(),
        })
        .collect()
}

/// Reject blank input and input longer than [`MAX_INPUT_CHARS`].
pub fn validate_input(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(RelayError::InvalidInput("input text is blank".to_string()));
    }
    let length = text.chars().count();
    if length > MAX_INPUT_CHARS {
        return Err(RelayError::InvalidInput(format!(
            "input text is {} characters, the limit is {}",
            length, MAX_INPUT_CHARS
        )));
    }
    Ok(())
}

/// Join translated words by index with single spaces, whatever order they arrived in.
pub fn join_words(mut words: Vec<(usize, String)>) -> String {
    words.sort_by_key(|(index, _)| *index);
    words
        .into_iter()
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validates, fans out per-word translations, joins and records the result.
pub struct TranslationOrchestrator {
    provider: Arc<dyn TranslationProvider>,
    sink: Arc<dyn RecordSink>,
    pool: WorkerPool,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    attempt_timeout: Option<Duration>,
}

impl TranslationOrchestrator {
    /// Create an orchestrator with the default retry policy and no attempt timeout.
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        sink: Arc<dyn RecordSink>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            provider,
            sink,
            pool,
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            attempt_timeout: None,
        }
    }

    /// Wire an orchestrator from configuration.
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn TranslationProvider>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self::new(provider, sink, WorkerPool::new(config.concurrency))
            .with_retry(RetryPolicy::new(config.max_attempts, config.initial_backoff()))
            .with_attempt_timeout(config.attempt_timeout())
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the clock used between retries.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Bound each attempt. The limit applies per wave of pool-sized word
    /// batches, so longer inputs get proportionally more time. A zero
    /// duration disables the limit.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Stop accepting word tasks. Idempotent.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    /// Current provider catalog, fetched fresh.
    pub async fn supported_languages(&self) -> Result<Catalog> {
        self.provider.fetch_supported_languages().await
    }

    /// Translate `job` word by word, retrying the whole pipeline on transient failures.
    pub async fn translate(&self, job: &TranslationJob) -> Result<String> {
        if let Err(e) = validate_input(&job.input_text) {
            warn!("Rejected request from {}: {}", job.caller_address, e);
            return Err(e);
        }

        let start_time = Instant::now();
        let mut attempts = 0;

        let result = self
            .retry
            .run(self.sleeper.as_ref(), |attempt| {
                attempts = attempt;
                self.run_attempt(job, attempt)
            })
            .await;

        match &result {
            Ok(text) => info!(
                "Translated {} chars {} -> {} for {} in {:.2}s ({} attempt(s), {} chars out)",
                job.input_text.chars().count(),
                job.source_language,
                job.target_language,
                job.caller_address,
                start_time.elapsed().as_secs_f64(),
                attempts,
                text.chars().count()
            ),
            Err(e) => warn!(
                "Translation {} -> {} for {} failed after {} attempt(s): {}",
                job.source_language, job.target_language, job.caller_address, attempts, e
            ),
        }

        result
    }

    async fn run_attempt(&self, job: &TranslationJob, attempt: u32) -> Result<String> {
        let mut state = PipelineState::Validating;
        debug!("Attempt {} started", attempt);

        let deadline = self
            .attempt_timeout
            .map(|limit| self.attempt_deadline(limit, job.input_text.split(' ').count()));

        let result = match deadline {
            Some(limit) => tokio::time::timeout(limit, self.run_pipeline(job, &mut state))
                .await
                .unwrap_or_else(|_| Err(RelayError::Timeout(limit))),
            None => self.run_pipeline(job, &mut state).await,
        };

        if let Err(ref e) = result {
            debug!(
                "Attempt {} moved from {} to {}: {}",
                attempt,
                state,
                PipelineState::Failed,
                e
            );
        }

        result
    }

    fn attempt_deadline(&self, per_wave: Duration, word_count: usize) -> Duration {
        let waves = word_count.div_ceil(self.pool.capacity()).max(1);
        per_wave.saturating_mul(u32::try_from(waves).unwrap_or(u32::MAX))
    }

    async fn run_pipeline(
        &self,
        job: &TranslationJob,
        state: &mut PipelineState,
    ) -> Result<String> {
        transition(state, PipelineState::Validating);
        let catalog = self.provider.fetch_supported_languages().await?;
        validate_pair(&job.source_language, &job.target_language, &catalog)?;

        transition(state, PipelineState::Dispatching);
        let tasks = split_words(&job.input_text);
        let words = self
            .translate_words(tasks, &job.source_language, &job.target_language, state)
            .await?;

        transition(state, PipelineState::Joining);
        let translated_text = join_words(words);

        transition(state, PipelineState::Persisting);
        let record = self
            .sink
            .store(NewTranslationRecord {
                caller_address: job.caller_address.clone(),
                input_text: job.input_text.clone(),
                translated_text: translated_text.clone(),
            })
            .await?;
        debug!("Stored record {}", record.id);

        transition(state, PipelineState::Completed);
        Ok(translated_text)
    }

    /// Translate all words concurrently within the pool bound.
    ///
    /// Returns on the first failure; the remaining futures are dropped with it,
    /// so no late result can reach the join.
    async fn translate_words(
        &self,
        tasks: Vec<WordTask>,
        source: &str,
        target: &str,
        state: &mut PipelineState,
    ) -> Result<Vec<(usize, String)>> {
        let total_words = tasks.len();
        debug!(
            "Dispatching {} words with up to {} concurrent requests using {}",
            total_words,
            self.pool.capacity(),
            self.provider.name()
        );

        let mut futures = FuturesUnordered::new();

        for task in tasks {
            let pool = &self.pool;
            let provider = &self.provider;

            futures.push(async move {
                // Waits if the pool is at capacity
                let _permit = pool.acquire().await?;

                let word_start = Instant::now();
                let translated = provider.translate_word(&task.word, source, target).await;
                debug!(
                    "Word {} finished in {}ms",
                    task.index,
                    word_start.elapsed().as_millis()
                );

                translated.map(|text| (task.index, text))
            });
        }

        transition(state, PipelineState::AwaitingAll);

        let mut results: Vec<(usize, String)> = Vec::with_capacity(total_words);
        while let Some(outcome) = futures.next().await {
            match outcome {
                Ok(word) => results.push(word),
                Err(e) => {
                    warn!(
                        "Word translation failed ({}/{} done), abandoning the rest: {}",
                        results.len(),
                        total_words,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(results)
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    if *state != next {
        debug!("Pipeline {} -> {}", state, next);
        *state = next;
    }
}
