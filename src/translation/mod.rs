/*!
 * Translation of string tables.
 *
 * It is split into several submodules:
 *
 * - `tokenizer`: placeholder and entity protection around translation
 * - `batch`: character-bounded batching of records
 * - `client`: paced, retrying access to the translation service
 * - `pipeline`: the resumable orchestrator and its events
 */

pub use self::batch::{split, Batch};
pub use self::client::{ClientOptions, LanguagePair, RetryPolicy, TranslationClient};
pub use self::pipeline::{PipelineConfig, TranslationPipeline};
pub use self::tokenizer::{protect, restore, TokenMap};

pub mod batch;
pub mod client;
pub mod pipeline;
pub mod tokenizer;
