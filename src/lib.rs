/*!
 * # xmltl - resumable translation of XML string tables
 *
 * A Rust library for batch translation of string tables through a
 * DeepLX-compatible service.
 *
 * ## Features
 *
 * - Character-bounded batching of records, one request per batch
 * - Placeholders (`{0}`) and character references (`&#10;`) never reach the
 *   translation service and survive the round trip byte for byte
 * - Output written incrementally, checkpointed after every batch and resumed
 *   after an interruption
 * - Paced requests, bounded or unbounded retry with backoff, proxy rotation
 * - Progress and cancellation through an event channel
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: String table parsing and incremental output
 * - `translation`: Batch translation:
 *   - `translation::tokenizer`: Placeholder and entity protection
 *   - `translation::batch`: Character-bounded batching
 *   - `translation::client`: Pacing, retry and egress rotation
 *   - `translation::pipeline`: Resumable orchestration and events
 * - `session`: Checkpoint sidecar and resume decisions
 * - `file_utils`: File system operations and hashing
 * - `app_controller`: Main application controller
 * - `language_utils`: Language code utilities
 * - `providers`: Translation service and egress implementations:
 *   - `providers::deeplx`: DeepLX HTTP client
 *   - `providers::proxy_pool`: Proxy rotation
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod session;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{Document, DocumentSchema, IncrementalWriter, TextRecord};
pub use errors::{PipelineError, TranslationError};
pub use session::{CheckpointStore, ResumeDecision};
pub use translation::pipeline::{PipelineEvent, RunOutcome, TranslationPipeline};
