// ABOUTME: Incremental decoding of streamed build, push and pull progress.
// ABOUTME: Surfaces each record and fails fast on the first daemon-reported error.

//! The daemon answers build, push and pull requests with a sequence of JSON
//! objects rather than a single document. Records are decoded one at a time
//! as they arrive, so progress is visible while the operation runs and an
//! embedded `error` stops decoding immediately.

mod decoder;
mod error;
mod record;

pub use decoder::{BUILD_SUCCESS_MARKER, decode_build, decode_progress, records_from_reader};
pub use error::ProgressError;
pub use record::ProgressRecord;

use futures::Stream;
use std::pin::Pin;

/// A boxed stream of decoded progress records.
pub type ProgressStream = Pin<Box<dyn Stream<Item = Result<ProgressRecord, ProgressError>> + Send>>;
