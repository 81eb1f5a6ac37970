//! Error type for `pod-protocol` (§7). `std`-only, so unlike
//! `pod_core::Error` this is built on `thiserror`, following
//! `src/error.rs`'s `InterpreterError::ValidationError(#[from]
//! VmValidationError)` pattern of wrapping a lower-layer error with
//! `#[from]`.

use pod_core::Tag;

/// Errors raised while translating identifiers or rewriting POD trees
/// between the v0 and v2 wire vocabularies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lower-layer `pod-core` operation failed (malformed input, type
    /// mismatch, builder shape violation, overflow).
    #[error(transparent)]
    Core(#[from] pod_core::Error),
    /// Remap attempted on a client whose v0 type table has not yet been
    /// populated by an `UpdateTypes` message (§5 "Shared resources").
    #[error("remap attempted before the client's v0 type table was initialised")]
    Uninitialised,
    /// Translation or shape mismatch mid-walk; fatal for the tree being
    /// rewritten (§4.E).
    #[error("remap failed at tag {tag:?}, offset {offset}")]
    RemapFailed {
        /// Tag under the cursor when the failure was detected.
        tag: Tag,
        /// Byte offset of that tag in its source buffer.
        offset: usize,
    },
    /// A property filter (§4.D) produced an empty result.
    #[error("property filter produced an empty choice")]
    NoIntersection,
}

/// Crate-local result alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;
