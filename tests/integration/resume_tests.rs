/*!
 * Tests for interrupting and resuming translation runs
 */

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::assert_ok;
use xmltl::errors::{PipelineError, ProviderError};
use xmltl::providers::mock::MockTranslator;
use xmltl::providers::{EgressIdentity, Translator};
use xmltl::session::CheckpointStore;
use xmltl::translation::pipeline::{
    event_channel, CancellationFlag, PipelineConfig, PipelineEvent, RunOutcome, TranslationPipeline,
};

use crate::common::{self, CancellingTranslator};

const CHAR_LIMIT: usize = 100;

struct Fixture {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
    reference: String,
}

/// A 20-record table and the output an uninterrupted run produces for it
async fn fixture() -> Result<Fixture> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        dir.path(),
        "strings.xml",
        &common::string_table(&common::numbered_records(20)),
    )?;
    let output = dir.path().join("strings_de.xml");

    let reference_path = dir.path().join("reference.xml");
    let outcome = pipeline(Arc::new(MockTranslator::working()), Some(20))
        .run(&input, &reference_path)
        .await?;
    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    let reference = fs::read_to_string(&reference_path)?;

    Ok(Fixture {
        _dir: dir,
        input,
        output,
        reference,
    })
}

fn pipeline(translator: Arc<dyn Translator>, retry_count: Option<u32>) -> TranslationPipeline {
    let config = PipelineConfig::new("en", "de").with_char_limit(CHAR_LIMIT);
    TranslationPipeline::new(config, common::quiet_client(translator, retry_count)).unwrap()
}

fn total_batches(outcome: RunOutcome) -> usize {
    match outcome {
        RunOutcome::Completed { total_batches, .. } | RunOutcome::Stopped { total_batches, .. } => total_batches,
    }
}

fn sidecar(output: &Path) -> PathBuf {
    CheckpointStore::sidecar_path_for(output)
}

/// Working translator that overwrites the input file during its first request, then stops the run
#[derive(Debug)]
struct RewritingTranslator {
    inner: MockTranslator,
    input: PathBuf,
    replacement: String,
    flag: CancellationFlag,
}

#[async_trait]
impl Translator for RewritingTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        egress: Option<&EgressIdentity>,
    ) -> Result<String, ProviderError> {
        if !self.flag.is_cancelled() {
            fs::write(&self.input, &self.replacement).map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
            self.flag.cancel();
        }
        self.inner.translate(text, source_language, target_language, egress).await
    }
}

fn replacement_records(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| (format!("0x{:08X}", i + 1), format!("Replacement text number {}", i + 1)))
        .collect()
}

/// Test that a run failing mid-way resumes and produces the uninterrupted output byte for byte
#[tokio::test]
async fn test_run_withFailureThenRerun_shouldResumeByteIdentical() -> Result<()> {
    let f = fixture().await?;

    // The third request fails and a single failure exhausts the retry budget
    let err = pipeline(Arc::new(MockTranslator::intermittent(3)), Some(1))
        .run(&f.input, &f.output)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Batch { batch: 2, .. }));
    assert!(sidecar(&f.output).exists());
    assert!(fs::read_to_string(sidecar(&f.output))?.contains("Last Batch: 1"));

    let mock = MockTranslator::working();
    let (sink, mut events) = event_channel();
    let outcome = pipeline(Arc::new(mock.clone()), Some(1))
        .with_events(sink)
        .run(&f.input, &f.output)
        .await?;

    let total = total_batches(outcome);
    assert!(total > 3);
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            total_batches: total,
            translated_batches: total - 2,
        }
    );
    assert_eq!(mock.request_count(), total - 2);
    assert_eq!(fs::read_to_string(&f.output)?, f.reference);
    assert!(!sidecar(&f.output).exists());

    let mut resumed_at = None;
    while let Ok(event) = events.try_recv() {
        if let PipelineEvent::Resumed { next_batch } = event {
            resumed_at = Some(next_batch);
        }
    }
    assert_eq!(resumed_at, Some(2));
    Ok(())
}

/// Test that a partial output edited after the checkpoint is discarded and retranslated
#[tokio::test]
async fn test_run_withTamperedOutput_shouldRestartFromScratch() -> Result<()> {
    let f = fixture().await?;

    assert!(pipeline(Arc::new(MockTranslator::intermittent(3)), Some(1))
        .run(&f.input, &f.output)
        .await
        .is_err());

    let mut partial = fs::read_to_string(&f.output)?;
    partial.push_str("<!-- edited -->\n");
    fs::write(&f.output, partial)?;

    let mock = MockTranslator::working();
    let (sink, mut events) = event_channel();
    let outcome = pipeline(Arc::new(mock.clone()), Some(1))
        .with_events(sink)
        .run(&f.input, &f.output)
        .await?;

    assert_eq!(mock.request_count(), total_batches(outcome));
    assert_eq!(fs::read_to_string(&f.output)?, f.reference);

    let mut restarted = false;
    while let Ok(event) = events.try_recv() {
        restarted |= matches!(event, PipelineEvent::Restarted { .. });
        assert!(!matches!(event, PipelineEvent::Resumed { .. }));
    }
    assert!(restarted);
    Ok(())
}

/// Test that a changed batch limit invalidates the checkpoint
#[tokio::test]
async fn test_run_withDifferentCharLimit_shouldNotResume() -> Result<()> {
    let f = fixture().await?;

    assert!(pipeline(Arc::new(MockTranslator::intermittent(3)), Some(1))
        .run(&f.input, &f.output)
        .await
        .is_err());

    let mock = MockTranslator::working();
    let config = PipelineConfig::new("en", "de").with_char_limit(CHAR_LIMIT * 2);
    let mut wider = TranslationPipeline::new(config, common::quiet_client(Arc::new(mock.clone()), Some(1)))?;
    let outcome = wider.run(&f.input, &f.output).await?;

    assert_eq!(mock.request_count(), total_batches(outcome));
    assert_eq!(fs::read_to_string(&f.output)?, f.reference);
    Ok(())
}

/// Test that a cancelled run stops between batches and resumes where it stopped
#[tokio::test]
async fn test_run_withCancellation_shouldStopBetweenBatchesAndResume() -> Result<()> {
    let f = fixture().await?;

    let flag = CancellationFlag::new();
    let outcome = assert_ok!(
        pipeline(Arc::new(CancellingTranslator::new(flag.clone(), 2)), Some(1))
            .with_cancellation(flag)
            .run(&f.input, &f.output)
            .await
    );
    let total = total_batches(outcome);
    assert_eq!(
        outcome,
        RunOutcome::Stopped {
            next_batch: 2,
            total_batches: total,
        }
    );
    assert!(sidecar(&f.output).exists());

    let mock = MockTranslator::working();
    let outcome = pipeline(Arc::new(mock.clone()), Some(1))
        .run(&f.input, &f.output)
        .await?;

    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(mock.request_count(), total - 2);
    assert_eq!(fs::read_to_string(&f.output)?, f.reference);
    Ok(())
}

/// Test that an input changed while the first batch is in flight invalidates the checkpoint
#[tokio::test]
async fn test_run_withInputChangedDuringFirstBatch_shouldRestartOnRerun() -> Result<()> {
    let f = fixture().await?;
    let replacement = common::string_table(&replacement_records(20));

    let flag = CancellationFlag::new();
    let rewriting = RewritingTranslator {
        inner: MockTranslator::working(),
        input: f.input.clone(),
        replacement: replacement.clone(),
        flag: flag.clone(),
    };
    let outcome = pipeline(Arc::new(rewriting), Some(1))
        .with_cancellation(flag)
        .run(&f.input, &f.output)
        .await?;
    assert!(matches!(outcome, RunOutcome::Stopped { next_batch: 1, .. }));
    assert_eq!(fs::read_to_string(&f.input)?, replacement);
    assert!(sidecar(&f.output).exists());

    let mock = MockTranslator::working();
    let (sink, mut events) = event_channel();
    let outcome = pipeline(Arc::new(mock.clone()), Some(1))
        .with_events(sink)
        .run(&f.input, &f.output)
        .await?;

    let total = total_batches(outcome);
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            total_batches: total,
            translated_batches: total,
        }
    );
    let written = fs::read_to_string(&f.output)?;
    assert!(written.contains("[de] Replacement text number 1\""));
    assert!(!written.contains("says hello"));

    let mut restarted = false;
    while let Ok(event) = events.try_recv() {
        restarted |= matches!(event, PipelineEvent::Restarted { .. });
        assert!(!matches!(event, PipelineEvent::Resumed { .. }));
    }
    assert!(restarted);
    Ok(())
}
