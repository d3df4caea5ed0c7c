//! Incremental artifact extraction.
//!
//! An [`ArtifactExtractor`] is fed the chunks of one generation stream. While
//! no trigger has been seen, text is released to the caller as it arrives;
//! once a trigger appears, visible text freezes at the trigger offset and the
//! rest of the stream is captured. [`ArtifactExtractor::finalize`] picks the
//! winning candidate and validates it.

mod error;
mod extractor;
mod finalize;
mod scanner;
mod spec;
mod validate;

pub use error::ValidationError;
pub use extractor::{ArtifactExtractor, ArtifactOutcome, Extraction, ExtractorState};
pub use finalize::select_candidate;
pub use spec::{ArtifactSpec, RootElement};
pub use validate::validate;
