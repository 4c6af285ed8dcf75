/*!
 * Pipeline orchestrator for resumable batch translation.
 *
 * The orchestrator drives one document through:
 * 1. Loading: parse records, protect character references
 * 2. Resuming: consult the checkpoint store for a start batch
 * 3. Per batch: translate, append to the output, checkpoint
 * 4. Finalizing: close the document and drop the checkpoint
 *
 * Batches are processed strictly in order. Cancellation is observed only
 * between batches, so the output and checkpoint always agree.
 */

use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info, warn};
use regex::Regex;

use super::events::{BatchProgress, CancellationFlag, EventSink, PipelineEvent, PipelineState, RunOutcome};
use crate::document::{Document, DocumentSchema, IncrementalWriter, TextRecord};
use crate::errors::{PipelineError, TranslationError};
use crate::session::{CheckpointStore, ResumeDecision};
use crate::translation::batch::{self, Batch};
use crate::translation::client::{LanguagePair, TranslationClient};
use crate::translation::tokenizer::{self, TokenMap, PLACEHOLDER_NAMESPACE, PLACEHOLDER_PATTERN};

/// Configuration for the translation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source language
    pub source_language: String,

    /// Target language
    pub target_language: String,

    /// Maximum characters per batch
    pub char_limit: usize,

    /// Regex for inline placeholders that must not be translated
    pub placeholder_pattern: String,

    /// Element and attribute names of the document
    pub schema: DocumentSchema,

    /// Retry a misaligned batch one record at a time
    pub per_record_fallback: bool,
}

impl PipelineConfig {
    /// Create a new pipeline configuration.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            char_limit: 5000,
            placeholder_pattern: PLACEHOLDER_PATTERN.to_string(),
            schema: DocumentSchema::default(),
            per_record_fallback: true,
        }
    }

    pub fn with_char_limit(mut self, char_limit: usize) -> Self {
        self.char_limit = char_limit;
        self
    }

    pub fn with_placeholder_pattern(mut self, pattern: &str) -> Self {
        self.placeholder_pattern = pattern.to_string();
        self
    }

    pub fn with_schema(mut self, schema: DocumentSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_per_record_fallback(mut self, enabled: bool) -> Self {
        self.per_record_fallback = enabled;
        self
    }
}

/// One batch travelling through translate, write and checkpoint
#[derive(Debug)]
struct BatchJob {
    index: usize,
    char_count: usize,
    records: Vec<TextRecord>,
}

impl BatchJob {
    fn new(index: usize, batch: Batch) -> Self {
        Self {
            index,
            char_count: batch.char_count(),
            records: batch.into_records(),
        }
    }

    fn with_records(self, records: Vec<TextRecord>) -> Self {
        Self { records, ..self }
    }
}

/// Sequential, resumable translation of one document at a time
pub struct TranslationPipeline {
    config: PipelineConfig,
    client: Arc<TranslationClient>,
    languages: LanguagePair,
    record_pattern: Regex,
    events: EventSink,
    cancellation: CancellationFlag,
    state: PipelineState,
}

impl TranslationPipeline {
    /// Create a pipeline; fails on a zero character limit or a bad pattern
    pub fn new(config: PipelineConfig, client: Arc<TranslationClient>) -> Result<Self, PipelineError> {
        if config.char_limit == 0 {
            return Err(PipelineError::Config("char_limit must be positive".to_string()));
        }
        let record_pattern = tokenizer::record_pattern(&config.placeholder_pattern)
            .map_err(|e| PipelineError::Config(format!("invalid placeholder pattern: {}", e)))?;
        let languages = LanguagePair::new(config.source_language.as_str(), config.target_language.as_str());

        Ok(Self {
            config,
            client,
            languages,
            record_pattern,
            events: EventSink::disabled(),
            cancellation: CancellationFlag::new(),
            state: PipelineState::Idle,
        })
    }

    /// Publish progress to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Stop between batches once `flag` is set
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Translate `input` into `output`, resuming from a valid checkpoint.
    pub async fn run(&mut self, input: &Path, output: &Path) -> Result<RunOutcome, PipelineError> {
        match self.execute(input, output).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Translation of {} failed: {}", input.display(), e);
                self.set_state(PipelineState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&mut self, input: &Path, output: &Path) -> Result<RunOutcome, PipelineError> {
        self.set_state(PipelineState::Loading);
        let document = Document::load(input, &self.config.schema)?;
        let total_records = document.records().len();
        let total_chars = document.total_chars();
        let source_hash = document.source_hash().to_string();
        let (records, entity_tokens) = document.into_parts();
        let batches = batch::split(records, self.config.char_limit);
        let total_batches = batches.len();

        self.set_state(PipelineState::Resuming);
        let mut store = CheckpointStore::new(input, output)
            .with_batch_limit(self.config.char_limit)
            .with_input_hash(source_hash);
        let mut decision = store.load().await?;
        if decision.start_batch() > total_batches {
            decision = store.invalidate(format!(
                "checkpoint points past the last batch ({} of {})",
                decision.start_batch(),
                total_batches
            ))?;
        }
        match &decision {
            ResumeDecision::Fresh => {}
            ResumeDecision::Resume { next_batch } => {
                self.events.emit(PipelineEvent::Resumed {
                    next_batch: *next_batch,
                });
            }
            ResumeDecision::Stale { reason } => {
                self.events.emit(PipelineEvent::Restarted {
                    reason: reason.clone(),
                });
            }
        }
        let start_batch = decision.start_batch();

        info!(
            "Translating {} ({} records, {} chars, {} batches) to {}",
            input.display(),
            total_records,
            total_chars,
            total_batches,
            output.display()
        );
        self.events.emit(PipelineEvent::Started {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            total_records,
            total_chars,
            total_batches,
            start_batch,
        });

        let writer = IncrementalWriter::new(output, self.config.schema.clone(), entity_tokens);
        let mut translated_chars: usize = batches[..start_batch].iter().map(Batch::char_count).sum();
        let mut translated_batches = 0;

        for (index, batch) in batches.into_iter().enumerate().skip(start_batch) {
            if self.cancellation.is_cancelled() {
                info!("Stop requested; {} of {} batches written", index, total_batches);
                self.set_state(PipelineState::Stopped);
                let outcome = RunOutcome::Stopped {
                    next_batch: index,
                    total_batches,
                };
                self.events.emit(PipelineEvent::Finished(outcome));
                return Ok(outcome);
            }

            self.set_state(PipelineState::Translating { batch: index });
            let job = self
                .translate_batch(BatchJob::new(index, batch))
                .await
                .map_err(|source| PipelineError::Batch { batch: index, source })?;

            self.set_state(PipelineState::Writing { batch: index });
            writer.write_batch(&job.records, index, total_batches)?;

            self.set_state(PipelineState::Checkpointing { batch: index });
            store.save(index).await?;

            translated_chars += job.char_count;
            translated_batches += 1;
            let progress = BatchProgress {
                batch_index: index,
                total_batches,
                translated_chars,
                total_chars,
            };
            info!(
                "Batch {}/{} done: {:.1}% translated, {} chars remaining",
                index + 1,
                total_batches,
                progress.percent(),
                progress.remaining_chars()
            );
            self.events.emit(PipelineEvent::BatchCompleted(progress));
        }

        self.set_state(PipelineState::Finalizing);
        if total_batches == 0 {
            writer.write_empty()?;
        }
        store.clear()?;
        self.set_state(PipelineState::Done);

        info!("Finished {}", output.display());
        let outcome = RunOutcome::Completed {
            total_batches,
            translated_batches,
        };
        self.events.emit(PipelineEvent::Finished(outcome));
        Ok(outcome)
    }

    /// Translate every record of `job`, keeping placeholders intact
    async fn translate_batch(&self, job: BatchJob) -> Result<BatchJob, TranslationError> {
        let protected: Vec<(String, TokenMap)> = job
            .records
            .iter()
            .map(|record| tokenizer::protect(&record.text, &self.record_pattern, PLACEHOLDER_NAMESPACE))
            .collect();
        let texts: Vec<String> = protected.iter().map(|(text, _)| text.clone()).collect();

        debug!(
            "Batch {}: {} records, {} chars",
            job.index + 1,
            texts.len(),
            job.char_count
        );

        let translated = match self.client.translate_lines(&texts, &self.languages).await {
            Ok(lines) => lines,
            Err(e) if e.is_line_mismatch() && self.config.per_record_fallback => {
                warn!("Batch {}: {}; translating records one by one", job.index + 1, e);
                let mut lines = Vec::with_capacity(texts.len());
                for text in &texts {
                    lines.push(self.client.translate_record(text, &self.languages).await?);
                }
                lines
            }
            Err(e) => return Err(e),
        };

        let records = job
            .records
            .iter()
            .zip(&protected)
            .zip(translated)
            .map(|((record, (_, tokens)), line)| record.with_text(tokenizer::restore(&line, tokens)))
            .collect();

        Ok(job.with_records(records))
    }

    fn set_state(&mut self, state: PipelineState) {
        debug!("Pipeline state: {:?}", state);
        self.state = state;
        self.events.emit(PipelineEvent::StateChanged(state));
    }
}
