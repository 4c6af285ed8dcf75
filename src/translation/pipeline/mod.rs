/*!
 * Resumable batch translation pipeline.
 *
 * - `orchestrator`: drives a document through load, resume, translate,
 *   write and checkpoint
 * - `events`: states, progress notifications and cancellation shared with
 *   front ends
 */

pub mod events;
pub mod orchestrator;

pub use events::{
    event_channel, BatchProgress, CancellationFlag, EventSink, PipelineEvent, PipelineState, RunOutcome,
};
pub use orchestrator::{PipelineConfig, TranslationPipeline};
