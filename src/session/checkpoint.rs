/*!
 * Checkpoint record and its sidecar text format.
 *
 * The sidecar is a handful of `Key: value` lines:
 *
 * ```text
 * Input File: strings.xml
 * Input Hash: 3a7bd3e2...
 * Output File: strings_de.xml
 * Output Hash: 9c56cc51...
 * Last Batch: 2
 * Batch Limit: 5000
 * ```
 */

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::errors::CheckpointError;

const KEY_INPUT_FILE: &str = "Input File";
const KEY_INPUT_HASH: &str = "Input Hash";
const KEY_OUTPUT_FILE: &str = "Output File";
const KEY_OUTPUT_HASH: &str = "Output Hash";
const KEY_LAST_BATCH: &str = "Last Batch";
const KEY_BATCH_LIMIT: &str = "Batch Limit";

/// Progress marker written after every completed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub input_path: PathBuf,
    pub input_hash: String,
    pub output_path: PathBuf,
    /// Hash of the partial output right after the batch was written
    pub output_hash: String,
    /// Zero-based index of the last batch fully written
    pub last_completed_batch: usize,
    /// Character limit the batches were built with
    pub batch_limit: Option<usize>,
}

impl Checkpoint {
    pub fn to_sidecar_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = writeln!(out, "{}: {}", KEY_INPUT_FILE, self.input_path.display());
        let _ = writeln!(out, "{}: {}", KEY_INPUT_HASH, self.input_hash);
        let _ = writeln!(out, "{}: {}", KEY_OUTPUT_FILE, self.output_path.display());
        let _ = writeln!(out, "{}: {}", KEY_OUTPUT_HASH, self.output_hash);
        let _ = writeln!(out, "{}: {}", KEY_LAST_BATCH, self.last_completed_batch);
        if let Some(limit) = self.batch_limit {
            let _ = writeln!(out, "{}: {}", KEY_BATCH_LIMIT, limit);
        }
        out
    }

    /// Parse sidecar content; unknown keys are ignored
    pub fn parse(content: &str) -> Result<Self, CheckpointError> {
        let mut input_path = None;
        let mut input_hash = None;
        let mut output_path = None;
        let mut output_hash = None;
        let mut last_completed_batch = None;
        let mut batch_limit = None;

        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                return Err(CheckpointError::Malformed(format!("unexpected line '{}'", line)));
            };
            let value = value.trim();

            match key.trim() {
                KEY_INPUT_FILE => input_path = Some(PathBuf::from(value)),
                KEY_INPUT_HASH => input_hash = Some(value.to_string()),
                KEY_OUTPUT_FILE => output_path = Some(PathBuf::from(value)),
                KEY_OUTPUT_HASH => output_hash = Some(value.to_string()),
                KEY_LAST_BATCH => last_completed_batch = Some(parse_index(KEY_LAST_BATCH, value)?),
                KEY_BATCH_LIMIT => batch_limit = Some(parse_index(KEY_BATCH_LIMIT, value)?),
                _ => {}
            }
        }

        Ok(Self {
            input_path: input_path.ok_or_else(|| missing(KEY_INPUT_FILE))?,
            input_hash: input_hash.ok_or_else(|| missing(KEY_INPUT_HASH))?,
            output_path: output_path.ok_or_else(|| missing(KEY_OUTPUT_FILE))?,
            output_hash: output_hash.ok_or_else(|| missing(KEY_OUTPUT_HASH))?,
            last_completed_batch: last_completed_batch.ok_or_else(|| missing(KEY_LAST_BATCH))?,
            batch_limit,
        })
    }
}

fn parse_index(key: &str, value: &str) -> Result<usize, CheckpointError> {
    value
        .parse()
        .map_err(|_| CheckpointError::Malformed(format!("'{}' is not a valid {}", value, key)))
}

fn missing(key: &str) -> CheckpointError {
    CheckpointError::Malformed(format!("missing '{}'", key))
}
