use core::fmt;

use crate::tag::Tag;

/// Closed set of reasons a tree can be rejected as [`Error::Malformed`].
///
/// A free-form string would do, but a closed enum lets callers match on
/// the reason without string comparison and lets tests enumerate every
/// rejection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MalformedReason {
    /// Fewer than 8 bytes remain where a header was expected.
    TruncatedHeader,
    /// A child's declared `size` would read past its parent's body.
    BodyOverrun,
    /// A size or offset was not a multiple of 8 where I1 requires it.
    BadAlignment,
    /// The `type` word did not match any [`Tag`].
    UnknownTag,
    /// An `Object` child was not a `Property` (I3).
    NonPropertyInObject,
    /// An `Array`/`Choice` element did not match the declared
    /// `child_type`/`child_size` (I4).
    HeterogeneousElement,
    /// A `String` body was empty or missing its NUL terminator (I7).
    ShortString,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TruncatedHeader => "truncated header",
            Self::BodyOverrun => "child body overruns parent",
            Self::BadAlignment => "size not 8-byte aligned",
            Self::UnknownTag => "unknown type tag",
            Self::NonPropertyInObject => "object child is not a property",
            Self::HeterogeneousElement => "array/choice element type mismatch",
            Self::ShortString => "string body missing NUL terminator",
        };
        f.write_str(text)
    }
}

/// Error type for every fallible operation in `pod-core`.
///
/// Hand-rolled rather than built on `thiserror`: this crate is meant to
/// stay usable under `no_std`, and `thiserror` requires `std::error::Error`.
/// A `std`-gated `impl std::error::Error` is provided below instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Bounds violation, bad alignment, or truncated header (§7). Fatal for
    /// the message containing it.
    Malformed {
        /// Byte offset at which the violation was detected.
        offset: usize,
        /// Why the tree was rejected.
        reason: MalformedReason,
    },
    /// The reader expected one tag and found another.
    TypeMismatch {
        /// Tag the caller asked for.
        expected: Tag,
        /// Tag actually present at the cursor.
        found: Tag,
    },
    /// Builder API misuse: close without open, nesting violation,
    /// heterogeneous array/choice child declared up front.
    Shape(&'static str),
    /// The builder ran out of buffer space; retry with `required` bytes.
    Overflow {
        /// Capacity that would have been sufficient.
        required: usize,
    },
    /// A property filter (§4.D) produced an empty result.
    NoIntersection,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { offset, reason } => {
                write!(f, "malformed POD at offset {offset}: {reason}")
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::Shape(detail) => write!(f, "builder shape violation: {detail}"),
            Self::Overflow { required } => {
                write!(f, "buffer overflow, required {required} bytes")
            }
            Self::NoIntersection => write!(f, "property filter produced an empty choice"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Crate-local result alias, following the convention of pairing a
/// hand-rolled error type with a `Result<T, E = Error>` shorthand.
pub type Result<T, E = Error> = core::result::Result<T, E>;
