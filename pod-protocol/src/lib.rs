//! v0 ↔ v2 protocol identifier table and tree remap (§4.E).
//!
//! Builds on `pod-core`'s codec the way `fuel-tx`/`fuel-compression` build
//! on `fuel-types`: this crate owns the session-scoped type table and the
//! bidirectional rewrite between the legacy (v0) and current (v2) wire
//! vocabularies, and knows nothing about framing a value's own bytes.

pub mod error;
pub mod remap;
pub mod type_table;

pub use error::{Error, Result};
pub use remap::{remap_from_v0, remap_to_v0};
pub use type_table::{
    ClientTypeTable, TypeTableRow, COMMAND_NODE_PAUSE, COMMAND_NODE_START, COMMAND_OBJECT,
    FORMAT_OBJECT, MEDIA_SUBTYPE_DSP, MEDIA_SUBTYPE_RAW, MEDIA_TYPE_AUDIO, MEDIA_TYPE_VIDEO,
    PROP_MEDIA_SUBTYPE, PROP_MEDIA_TYPE, TYPE_TABLE,
};
