/*!
 * Input document model and incremental output writer.
 */

pub mod model;
pub mod writer;

pub use model::{Document, DocumentSchema, TextRecord};
pub use writer::IncrementalWriter;
