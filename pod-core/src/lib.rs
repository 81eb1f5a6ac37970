//! Tagged, byte-aligned binary value codec ("POD").
//!
//! This crate implements components A–D of the serialization core: the
//! fixed on-wire [`layout`], the append-only [`builder`], the
//! type-checked [`parser`], and the [`choice`]/object semantics layered
//! on top. It knows nothing about the v0/v2 protocol remap — that lives
//! in the `pod-protocol` crate, built on this one, the same way
//! `fuel-tx`/`fuel-compression` are built on `fuel-types`.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod builder;
pub mod choice;
pub mod error;
pub mod flags;
pub mod layout;
pub mod parser;
pub mod tag;
pub mod value;

pub use choice::filter;
pub use error::{Error, MalformedReason, Result};
pub use flags::{LegacyPropertyFlags, PropertyFlags};
pub use tag::Tag;
pub use value::{Choice, ChoiceType, Object, PodValue, Property};
