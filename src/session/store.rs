/*!
 * Checkpoint store: decides where a run resumes and records progress.
 *
 * A checkpoint is trusted only when the input and the partial output on disk
 * are byte-for-byte what they were when it was written. Anything else is
 * stale: the partial output and the sidecar are removed and the document is
 * translated from the first batch.
 */

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::checkpoint::Checkpoint;
use crate::errors::CheckpointError;
use crate::file_utils::FileManager;

/// Suffix appended to the output path to name the sidecar
pub const SIDECAR_SUFFIX: &str = ".prc";

/// Where a run should start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeDecision {
    /// No checkpoint found
    Fresh,
    /// Valid checkpoint; continue at `next_batch`
    Resume { next_batch: usize },
    /// Checkpoint did not match the files on disk and was discarded
    Stale { reason: String },
}

impl ResumeDecision {
    pub fn start_batch(&self) -> usize {
        match self {
            Self::Resume { next_batch } => *next_batch,
            Self::Fresh | Self::Stale { .. } => 0,
        }
    }
}

/// Owns the sidecar of one output file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    input_path: PathBuf,
    output_path: PathBuf,
    sidecar_path: PathBuf,
    batch_limit: Option<usize>,
    input_hash: Option<String>,
}

impl CheckpointStore {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        let input_path = input_path.into();
        let output_path = output_path.into();
        let sidecar_path = Self::sidecar_path_for(&output_path);
        Self {
            input_path,
            output_path,
            sidecar_path,
            batch_limit: None,
            input_hash: None,
        }
    }

    /// Record the character limit and require it to match on load
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    /// Use the hash of the input as it was read for translation.
    ///
    /// Without it the input file is hashed on first use, which may see a
    /// newer version than the one being translated.
    pub fn with_input_hash(mut self, hash: impl Into<String>) -> Self {
        self.input_hash = Some(hash.into());
        self
    }

    pub fn sidecar_path_for(output_path: &Path) -> PathBuf {
        let mut name = output_path.as_os_str().to_owned();
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }

    pub fn exists(&self) -> bool {
        self.sidecar_path.is_file()
    }

    /// Decide where to start, discarding a stale checkpoint
    pub async fn load(&mut self) -> Result<ResumeDecision, CheckpointError> {
        if !self.exists() {
            debug!("No checkpoint at {}", self.sidecar_path.display());
            return Ok(ResumeDecision::Fresh);
        }

        let content = fs::read_to_string(&self.sidecar_path)?;
        let checkpoint = match Checkpoint::parse(&content) {
            Ok(checkpoint) => checkpoint,
            Err(CheckpointError::Malformed(reason)) => {
                return self.invalidate(format!("malformed checkpoint ({})", reason));
            }
            Err(e) => return Err(e),
        };

        if !self.output_path.is_file() {
            return self.invalidate("partial output is missing");
        }
        if checkpoint.input_path != self.input_path || checkpoint.output_path != self.output_path {
            return self.invalidate("checkpoint belongs to different files");
        }
        if checkpoint.input_hash != self.input_hash().await? {
            return self.invalidate("input file changed");
        }
        if checkpoint.output_hash != FileManager::hash_file_async(&self.output_path).await? {
            return self.invalidate("partial output changed");
        }
        if let (Some(stored), Some(current)) = (checkpoint.batch_limit, self.batch_limit) {
            if stored != current {
                return self.invalidate(format!("batch limit changed from {} to {}", stored, current));
            }
        }

        let next_batch = checkpoint.last_completed_batch + 1;
        info!(
            "Resuming {} at batch {}",
            self.input_path.display(),
            next_batch + 1
        );
        Ok(ResumeDecision::Resume { next_batch })
    }

    /// Record `batch_index` as completed; the output must already be synced
    pub async fn save(&mut self, batch_index: usize) -> Result<(), CheckpointError> {
        let checkpoint = Checkpoint {
            input_path: self.input_path.clone(),
            input_hash: self.input_hash().await?,
            output_path: self.output_path.clone(),
            output_hash: FileManager::hash_file_async(&self.output_path).await?,
            last_completed_batch: batch_index,
            batch_limit: self.batch_limit,
        };

        // Replace atomically so an interrupted save never leaves half a sidecar
        let mut tmp = self.sidecar_path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, checkpoint.to_sidecar_string())?;
        fs::rename(&tmp, &self.sidecar_path)?;

        debug!("Checkpoint saved after batch {}", batch_index + 1);
        Ok(())
    }

    /// Remove the sidecar after a completed run
    pub fn clear(&self) -> Result<(), CheckpointError> {
        FileManager::remove_if_exists(&self.sidecar_path)?;
        Ok(())
    }

    /// Discard the checkpoint and the partial output it describes
    pub fn invalidate(&mut self, reason: impl Into<String>) -> Result<ResumeDecision, CheckpointError> {
        let reason = reason.into();
        warn!("Discarding checkpoint {}: {}", self.sidecar_path.display(), reason);
        FileManager::remove_if_exists(&self.output_path)?;
        self.clear()?;
        Ok(ResumeDecision::Stale { reason })
    }

    async fn input_hash(&mut self) -> Result<String, CheckpointError> {
        if let Some(hash) = &self.input_hash {
            return Ok(hash.clone());
        }
        let hash = FileManager::hash_file_async(&self.input_path).await?;
        self.input_hash = Some(hash.clone());
        Ok(hash)
    }
}
