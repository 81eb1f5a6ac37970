//! Decoded-tree representation.
//!
//! The [`Builder`](crate::builder::Builder)/[`Parser`](crate::parser::Parser)
//! pair works directly over bytes, as §4.B/§4.C specify. [`PodValue`] is a
//! convenience owned representation used by callers that want to walk a
//! whole tree at once (property filtering, remap) rather than drive the
//! cursor by hand; it is built from a `Parser` and consumed by a
//! `Builder`, never dereferenced on its own wire.

use alloc::string::String;
use alloc::vec::Vec;

use crate::tag::Tag;

/// `choice_type` discriminant (§3 "Choice semantics").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum ChoiceType {
    /// One value, no constraint. Exactly one element (I5).
    None = 0,
    /// `[default, min, max]`.
    Range = 1,
    /// `[default, min, max, step]`.
    Step = 2,
    /// `[default, alt1, alt2, ...]`, at least one element.
    Enum = 3,
    /// `[default, mask1, mask2, ...]`, at least one element.
    Flags = 4,
}

impl ChoiceType {
    /// Recovers a `ChoiceType` from its wire value.
    pub const fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::None,
            1 => Self::Range,
            2 => Self::Step,
            3 => Self::Enum,
            4 => Self::Flags,
            _ => return None,
        })
    }

    /// Minimum number of elements a Choice of this type must carry.
    pub const fn min_elements(self) -> usize {
        match self {
            Self::None => 1,
            Self::Range => 3,
            Self::Step => 4,
            Self::Enum | Self::Flags => 1,
        }
    }
}

/// Owned decoded POD tree.
///
/// Scalar variants copy their value out of the buffer; `Bytes`/`String`
/// are materialized into owned storage here because `PodValue` is meant
/// to outlive the buffer it was parsed from (remap output, property
/// filter results) — the zero-copy borrowing view lives in
/// [`crate::parser::Parser`] instead.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PodValue {
    /// `None` tag, empty body.
    None,
    /// `Bool` tag.
    Bool(bool),
    /// `Id` tag.
    Id(u32),
    /// `Int` tag.
    Int(i32),
    /// `Long` tag.
    Long(i64),
    /// `Float` tag.
    Float(f32),
    /// `Double` tag.
    Double(f64),
    /// `String` tag, NUL terminator not included.
    String(String),
    /// `Bytes` tag.
    Bytes(Vec<u8>),
    /// `Pointer` tag: `(type, opaque)`. Never dereferenced.
    Pointer(u32, u64),
    /// `Fd` tag: index into an out-of-band fd table.
    Fd(i64),
    /// `Rectangle` tag: `(width, height)`.
    Rectangle(u32, u32),
    /// `Fraction` tag: `(num, denom)`.
    Fraction(u32, u32),
    /// `Array` tag: homogeneous children, all of `child_tag`.
    Array {
        /// Element tag; must be fixed-size per I4.
        child_tag: Tag,
        /// Decoded elements.
        items: Vec<PodValue>,
    },
    /// `Struct` tag: heterogeneous children.
    Struct(Vec<PodValue>),
    /// `Object` tag.
    Object(Object),
    /// `Choice` tag.
    Choice(Choice),
}

impl PodValue {
    /// The [`Tag`] this value would be encoded with.
    pub fn tag(&self) -> Tag {
        match self {
            Self::None => Tag::None,
            Self::Bool(_) => Tag::Bool,
            Self::Id(_) => Tag::Id,
            Self::Int(_) => Tag::Int,
            Self::Long(_) => Tag::Long,
            Self::Float(_) => Tag::Float,
            Self::Double(_) => Tag::Double,
            Self::String(_) => Tag::String,
            Self::Bytes(_) => Tag::Bytes,
            Self::Pointer(..) => Tag::Pointer,
            Self::Fd(_) => Tag::Fd,
            Self::Rectangle(..) => Tag::Rectangle,
            Self::Fraction(..) => Tag::Fraction,
            Self::Array { .. } => Tag::Array,
            Self::Struct(_) => Tag::Struct,
            Self::Object(_) => Tag::Object,
            Self::Choice(_) => Tag::Choice,
        }
    }
}

/// An `Object` body: `(object_type, object_id)` plus its properties.
///
/// §4.D: the core does not enforce the per-(object_type) key→meaning
/// table; it only guarantees structural access. `properties` preserves
/// encounter order (§5 "Ordering"); [`Object::find_prop`] implements the
/// first-wins lookup I6 specifies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Object {
    /// Schema class of this object.
    pub object_type: u32,
    /// Instance discriminator.
    pub object_id: u32,
    /// Properties in encounter order.
    pub properties: Vec<Property>,
}

impl Object {
    /// Returns the first property with the given `key` (I6: first-wins on
    /// duplicates), or `None` if no property has that key.
    pub fn find_prop(&self, key: u32) -> Option<&Property> {
        self.properties.iter().find(|p| p.key == key)
    }
}

/// `(key, flags, value)`, legal only inside an [`Object`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Property {
    /// Property key, unique within its object per I6.
    pub key: u32,
    /// v2 flag bitmask.
    pub flags: crate::flags::PropertyFlags,
    /// Property value, itself possibly a `Choice`.
    pub value: alloc::boxed::Box<PodValue>,
}

/// A constrained value: `choice_type` plus the homogeneous element stream
/// it constrains (§3/§4.D).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Choice {
    /// Which constraint discipline the elements encode.
    pub choice_type: ChoiceType,
    /// Opaque flags, copied through unchanged by the codec.
    pub flags: u32,
    /// Element tag; all elements share this tag and, implicitly, its
    /// fixed body size (I4).
    pub child_tag: Tag,
    /// `elements[0]` is the preferred/default value; the rest are
    /// alternatives whose meaning depends on `choice_type`.
    pub elements: Vec<PodValue>,
}

impl Choice {
    /// The uniform `get_values` view from §4.C: every property value can
    /// be treated as a Choice. A non-Choice value synthesizes
    /// `(1, None, value)`.
    pub fn uniform_view(value: &PodValue) -> (usize, ChoiceType, &[PodValue]) {
        match value {
            PodValue::Choice(c) => (c.elements.len(), c.choice_type, &c.elements),
            other => (1, ChoiceType::None, core::slice::from_ref(other)),
        }
    }
}
