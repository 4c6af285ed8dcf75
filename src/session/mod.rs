/*!
 * Resumable session state.
 *
 * This module provides:
 * - The checkpoint record and its sidecar format
 * - The store deciding whether an interrupted run can resume
 */

pub mod checkpoint;
pub mod store;

pub use checkpoint::Checkpoint;
pub use store::{CheckpointStore, ResumeDecision, SIDECAR_SUFFIX};
