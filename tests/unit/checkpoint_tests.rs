/*!
 * Tests for the checkpoint sidecar and resume decisions
 */

use anyhow::Result;
use std::fs;
use xmltl::session::{Checkpoint, CheckpointStore, ResumeDecision};

use crate::common;

/// Test that a matching checkpoint after batch 2 resumes at batch 3
#[tokio::test]
async fn test_load_withMatchingHashes_shouldResumeAfterLastBatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "in.xml", "<StblData />")?;
    let output = common::create_test_file(temp_dir.path(), "in_de.xml", "partial output")?;

    CheckpointStore::new(&input, &output).save(2).await?;

    let decision = CheckpointStore::new(&input, &output).load().await?;
    assert_eq!(decision, ResumeDecision::Resume { next_batch: 3 });
    Ok(())
}

/// Test that an output hash mismatch discards the partial output and restarts at 0
#[tokio::test]
async fn test_load_withOutputHashMismatch_shouldRestartFromZero() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "in.xml", "<StblData />")?;
    let output = common::create_test_file(temp_dir.path(), "in_de.xml", "partial output")?;

    let mut store = CheckpointStore::new(&input, &output);
    store.save(2).await?;
    fs::write(&output, "partial output, edited")?;

    let decision = store.load().await?;
    assert_eq!(decision.start_batch(), 0);
    assert!(matches!(decision, ResumeDecision::Stale { .. }));
    assert!(!output.exists());
    assert!(!store.sidecar_path().exists());
    Ok(())
}

/// Test that a checkpoint written for other files is not trusted
#[tokio::test]
async fn test_load_withForeignCheckpoint_shouldBeStale() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "in.xml", "<StblData />")?;
    let output = common::create_test_file(temp_dir.path(), "in_de.xml", "partial output")?;
    let store = CheckpointStore::new(&input, &output);

    let foreign = Checkpoint {
        input_path: temp_dir.path().join("other.xml"),
        input_hash: "0".repeat(64),
        output_path: output.clone(),
        output_hash: "0".repeat(64),
        last_completed_batch: 4,
        batch_limit: None,
    };
    fs::write(store.sidecar_path(), foreign.to_sidecar_string())?;

    let decision = CheckpointStore::new(&input, &output).load().await?;
    assert!(matches!(decision, ResumeDecision::Stale { .. }));
    Ok(())
}

/// Test the sidecar layout
#[tokio::test]
async fn test_save_shouldWriteLabelledSidecarNextToOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "in.xml", "<StblData />")?;
    let output = common::create_test_file(temp_dir.path(), "in_de.xml", "partial output")?;

    let mut store = CheckpointStore::new(&input, &output).with_batch_limit(5000);
    store.save(0).await?;

    let sidecar = fs::read_to_string(temp_dir.path().join("in_de.xml.prc"))?;
    let keys: Vec<&str> = sidecar.lines().filter_map(|l| l.split(':').next()).collect();
    assert_eq!(
        keys,
        vec!["Input File", "Input Hash", "Output File", "Output Hash", "Last Batch", "Batch Limit"]
    );
    assert!(sidecar.contains("Last Batch: 0"));
    Ok(())
}
