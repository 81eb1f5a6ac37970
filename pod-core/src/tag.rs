use core::fmt;

/// Wire-level type tag of a POD value.
///
/// Names carry no language meaning; they are the closed vocabulary §3
/// fixes for the `type` word of a POD header. `repr(u32)` makes the
/// numeric value the on-wire value, so `Tag as u32` is the wire encoding
/// and [`Tag::from_u32`] is the inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[repr(u32)]
#[non_exhaustive]
pub enum Tag {
    /// Empty body.
    None = 0,
    /// One 32-bit word, 0 or 1.
    Bool = 1,
    /// One 32-bit identifier from a domain.
    Id = 2,
    /// 32-bit signed integer.
    Int = 3,
    /// 64-bit signed integer.
    Long = 4,
    /// IEEE-754 32-bit float.
    Float = 5,
    /// IEEE-754 64-bit float.
    Double = 6,
    /// NUL-terminated UTF-8 string, size includes the terminator.
    String = 7,
    /// Opaque byte array.
    Bytes = 8,
    /// `(type, 64-bit opaque)`, never dereferenced on the wire.
    Pointer = 9,
    /// Index into an out-of-band file-descriptor table.
    Fd = 10,
    /// `(width: u32, height: u32)`.
    Rectangle = 11,
    /// `(num: u32, denom: u32)`.
    Fraction = 12,
    /// Homogeneous array of fixed-size primitives.
    Array = 13,
    /// Heterogeneous sequence of children.
    Struct = 14,
    /// `(object_type, object_id)` plus a sequence of `Property` children.
    Object = 15,
    /// `(key, flags, value)`, legal only inside an `Object`.
    Property = 16,
    /// Constrained value: a preferred default plus alternatives.
    Choice = 17,
    /// Timestamped control stream.
    Sequence = 18,
}

impl Tag {
    /// Recovers a `Tag` from its on-wire `u32` value.
    pub const fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::None,
            1 => Self::Bool,
            2 => Self::Id,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::String,
            8 => Self::Bytes,
            9 => Self::Pointer,
            10 => Self::Fd,
            11 => Self::Rectangle,
            12 => Self::Fraction,
            13 => Self::Array,
            14 => Self::Struct,
            15 => Self::Object,
            16 => Self::Property,
            17 => Self::Choice,
            18 => Self::Sequence,
            _ => return None,
        })
    }

    /// Fixed body size in bytes for tags whose body size never varies, or
    /// `None` for tags whose body size depends on the value (`String`,
    /// `Bytes`, `Array`, `Struct`, `Object`, `Choice`, `Sequence`,
    /// `Property`).
    ///
    /// This is what makes a tag legal as an `Array`/`Choice` element type
    /// per I4: only fixed-size tags may appear there.
    pub const fn fixed_body_size(self) -> Option<usize> {
        match self {
            Self::None => Some(0),
            Self::Bool | Self::Id | Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double | Self::Fd => Some(8),
            Self::Rectangle | Self::Fraction => Some(8),
            // (type: u32, padding: u32, opaque: u64), always treated as
            // in-process-only per §3 — never dereferenced on the wire.
            Self::Pointer => Some(16),
            Self::String
            | Self::Bytes
            | Self::Array
            | Self::Struct
            | Self::Object
            | Self::Property
            | Self::Choice
            | Self::Sequence => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn round_trips_every_tag_through_its_wire_value() {
        for tag in Tag::iter() {
            assert_eq!(Tag::from_u32(tag as u32), Some(tag));
        }
    }

    #[test]
    fn unknown_wire_value_is_rejected() {
        assert_eq!(Tag::from_u32(0xffff), None);
    }
}
