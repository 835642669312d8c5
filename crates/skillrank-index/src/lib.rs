//! Builds the `INDEX.yaml` artifact by asking an AI model to describe each skill.

pub mod builder;
pub mod error;
pub mod extract;
pub mod progress;
pub mod prompt;

pub use builder::{IndexBuilder, IndexReport};
pub use error::IndexError;
pub use extract::ExtractedMetadata;
pub use progress::{ProgressEvent, ProgressSink, RecordingSink, SilentSink, Status, StdoutSink};
