//! Bidirectional v0 ↔ v2 POD tree rewrite (§4.E).
//!
//! `remap_from_v0`/`remap_to_v0` drive a `pod_core::parser::Parser` over
//! the source tree and a `pod_core::builder::Builder` over a
//! caller-supplied output buffer — the parser/builder pair bridges the
//! two wire shapes exactly as §2's "Remap path" note describes, so no
//! intermediate owned tree is ever allocated. The walk is expressed as
//! mutual recursion between the v0 and v2 arms (§9 allows an equivalent
//! iterative work-stack walker; mutual recursion mirrors the shape of
//! `fuel-compression`'s `CompressibleBy`/`DecompressibleBy` pair, despite
//! that trait being async there and synchronous here).

use pod_core::builder::Builder;
use pod_core::flags::{LegacyPropertyFlags, PropertyFlags};
use pod_core::parser::{ContainerInfo, Parser};
use pod_core::value::ChoiceType;
use pod_core::Tag;

use crate::error::{Error, Result};
use crate::type_table::{ClientTypeTable, COMMAND_OBJECT, FORMAT_OBJECT, PROP_MEDIA_SUBTYPE, PROP_MEDIA_TYPE};

fn fail(tag: Tag, offset: usize) -> Error {
    tracing::warn!(?tag, offset, "remap failed");
    Error::RemapFailed { tag, offset }
}

/// Copies one fixed-size primitive from `p` to `b`, translating its
/// value through `from` first if `tag == Id`. Used both for top-level
/// scalars and for `Array`/`Choice` element streams.
///
/// Any `pod_core::Error` raised here (a type mismatch from a
/// heterogeneous `Choice` element, a builder shape violation) becomes
/// `Error::RemapFailed` rather than propagating as `Error::Core`: §4.E/§7
/// require mid-walk failures like "mismatched child types in a Choice" to
/// report the offending tag and offset, which `RemapFailed` carries and a
/// bare wrapped `pod_core::Error` does not.
fn copy_scalar(
    p: &mut Parser,
    b: &mut Builder,
    tag: Tag,
    translate: &dyn Fn(u32) -> Option<u32>,
) -> Result<()> {
    let offset = p.offset();
    match tag {
        Tag::None => {
            p.get_none().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::None, &[]).map_err(|_| fail(tag, offset))?;
        }
        Tag::Bool => {
            let v = p.get_bool().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::Bool, &(v as u32).to_le_bytes())
                .map_err(|_| fail(tag, offset))?;
        }
        Tag::Id => {
            let slot = p.get_id().map_err(|_| fail(tag, offset))?;
            let translated = translate(slot).ok_or_else(|| fail(Tag::Id, offset))?;
            b.primitive(Tag::Id, &translated.to_le_bytes())
                .map_err(|_| fail(tag, offset))?;
        }
        Tag::Int => {
            let v = p.get_i32().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::Int, &v.to_le_bytes()).map_err(|_| fail(tag, offset))?;
        }
        Tag::Long => {
            let v = p.get_i64().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::Long, &v.to_le_bytes()).map_err(|_| fail(tag, offset))?;
        }
        Tag::Float => {
            let v = p.get_f32().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::Float, &v.to_le_bytes())
                .map_err(|_| fail(tag, offset))?;
        }
        Tag::Double => {
            let v = p.get_f64().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::Double, &v.to_le_bytes())
                .map_err(|_| fail(tag, offset))?;
        }
        Tag::Fd => {
            let v = p.get_fd().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::Fd, &v.to_le_bytes()).map_err(|_| fail(tag, offset))?;
        }
        Tag::Rectangle => {
            let (w, h) = p.get_rectangle().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::Rectangle, &[w.to_le_bytes(), h.to_le_bytes()].concat())
                .map_err(|_| fail(tag, offset))?;
        }
        Tag::Fraction => {
            let (n, d) = p.get_fraction().map_err(|_| fail(tag, offset))?;
            b.primitive(Tag::Fraction, &[n.to_le_bytes(), d.to_le_bytes()].concat())
                .map_err(|_| fail(tag, offset))?;
        }
        Tag::Pointer => {
            let (t, op) = p.get_pointer().map_err(|_| fail(tag, offset))?;
            let mut body = [0u8; 16];
            body[0..4].copy_from_slice(&t.to_le_bytes());
            body[8..16].copy_from_slice(&op.to_le_bytes());
            b.primitive(Tag::Pointer, &body).map_err(|_| fail(tag, offset))?;
        }
        other => return Err(fail(other, offset)),
    }
    Ok(())
}

fn choice_type_from_legacy(flags: LegacyPropertyFlags) -> ChoiceType {
    if !flags.contains(LegacyPropertyFlags::UNSET) {
        return ChoiceType::None;
    }
    if flags.contains(LegacyPropertyFlags::RANGE_STEP) {
        ChoiceType::Step
    } else if flags.contains(LegacyPropertyFlags::RANGE_ENUM) {
        ChoiceType::Enum
    } else if flags.contains(LegacyPropertyFlags::RANGE_FLAGS) {
        ChoiceType::Flags
    } else if flags.contains(LegacyPropertyFlags::RANGE_MIN_MAX) {
        ChoiceType::Range
    } else {
        ChoiceType::None
    }
}

fn legacy_range_bits(choice_type: ChoiceType) -> LegacyPropertyFlags {
    match choice_type {
        ChoiceType::None => LegacyPropertyFlags::empty(),
        ChoiceType::Range => LegacyPropertyFlags::UNSET | LegacyPropertyFlags::RANGE_MIN_MAX,
        ChoiceType::Step => LegacyPropertyFlags::UNSET | LegacyPropertyFlags::RANGE_STEP,
        ChoiceType::Enum => LegacyPropertyFlags::UNSET | LegacyPropertyFlags::RANGE_ENUM,
        ChoiceType::Flags => LegacyPropertyFlags::UNSET | LegacyPropertyFlags::RANGE_FLAGS,
    }
}

/// Rewrites one v0 POD tree at the parser's cursor into v2 form,
/// appending it to `b`. `client` must already be initialised (§5).
pub fn remap_from_v0(client: &ClientTypeTable, p: &mut Parser, b: &mut Builder) -> Result<()> {
    if !client.is_initialised() {
        return Err(Error::Uninitialised);
    }
    walk_from_v0(client, p, b)
}

fn walk_from_v0(client: &ClientTypeTable, p: &mut Parser, b: &mut Builder) -> Result<()> {
    let tag = p.peek_type()?;
    match tag {
        Tag::String => {
            let s = p.get_str()?;
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            b.primitive(Tag::String, &bytes)?;
        }
        Tag::Bytes => {
            let bytes = p.get_bytes()?.to_vec();
            b.primitive(Tag::Bytes, &bytes)?;
        }
        Tag::Array => {
            let ContainerInfo::Array { child_tag, child_size } = p.enter()? else {
                unreachable!()
            };
            b.open_array(child_tag, child_size)?;
            while p.next()?.is_some() {
                copy_scalar(p, b, child_tag, &|slot| client.from_v0(slot))?;
            }
            p.leave()?;
            b.close()?;
        }
        Tag::Struct => {
            p.enter()?;
            b.open_struct()?;
            while p.next()?.is_some() {
                walk_from_v0(client, p, b)?;
            }
            p.leave()?;
            b.close()?;
        }
        Tag::Object => remap_object_from_v0(client, p, b)?,
        Tag::None
        | Tag::Bool
        | Tag::Id
        | Tag::Int
        | Tag::Long
        | Tag::Float
        | Tag::Double
        | Tag::Fd
        | Tag::Rectangle
        | Tag::Fraction
        | Tag::Pointer => copy_scalar(p, b, tag, &|slot| client.from_v0(slot))?,
        other => return Err(fail(other, p.offset())),
    }
    Ok(())
}

fn remap_object_from_v0(client: &ClientTypeTable, p: &mut Parser, b: &mut Builder) -> Result<()> {
    let object_offset = p.offset();
    let ContainerInfo::Object { object_type, object_id } = p.enter()? else {
        unreachable!()
    };
    // v0 carries (id, type) in the wire positions our generic parser
    // reads as (object_type, object_id); swap before translating.
    let v0_id_slot = object_type;
    let v0_type_slot = object_id;

    let (v2_type, v2_id) = if v0_type_slot == 0 {
        // Command sentinel (§9 Open Question decision): `remap_to_v0`
        // writes (type_slot=0, id_slot=translated command row) instead
        // of the generic symmetric swap, so undo that here rather than
        // translating slot 0 as if it were a real type row.
        let row = client
            .from_v0(v0_id_slot)
            .ok_or_else(|| fail(Tag::Object, object_offset))?;
        (COMMAND_OBJECT, row)
    } else {
        let t = client
            .from_v0(v0_type_slot)
            .ok_or_else(|| fail(Tag::Object, object_offset))?;
        let i = client
            .from_v0(v0_id_slot)
            .ok_or_else(|| fail(Tag::Object, object_offset))?;
        (t, i)
    };

    b.open_object(v2_type, v2_id)?;

    let mut index: u32 = 0;
    while let Some(child_tag) = p.next()? {
        let key = if v2_type == FORMAT_OBJECT && index < 2 {
            if index == 0 {
                PROP_MEDIA_TYPE
            } else {
                PROP_MEDIA_SUBTYPE
            }
        } else {
            index
        };

        if child_tag == Tag::Property {
            remap_prop_from_v0(client, p, b, key)?;
        } else {
            b.open_property(key, (PropertyFlags::READ | PropertyFlags::WRITE).bits())?;
            walk_from_v0(client, p, b)?;
            b.close()?;
        }
        index += 1;
    }
    p.leave()?;
    b.close()?;
    Ok(())
}

/// Decodes one legacy `Prop` (flat key/flags/default/alternatives, no
/// nested `Choice`) and re-emits it as a v2 `Property` wrapping a
/// `Choice`.
fn remap_prop_from_v0(
    client: &ClientTypeTable,
    p: &mut Parser,
    b: &mut Builder,
    positional_key: u32,
) -> Result<()> {
    let prop_offset = p.offset();
    let ContainerInfo::Property { key: v0_key, flags: v0_flags_raw } = p.enter()? else {
        unreachable!()
    };
    let v0_flags = LegacyPropertyFlags::from_bits_truncate(v0_flags_raw);
    let choice_type = choice_type_from_legacy(v0_flags);
    let v2_key = client.from_v0(v0_key).unwrap_or(positional_key);
    let v2_flags: PropertyFlags = v0_flags.into();

    b.open_property(v2_key, v2_flags.bits())?;
    if choice_type == ChoiceType::None {
        // Degenerate Prop: exactly the default value, no Choice wrapper
        // needed, but §4.D still treats any value as Choice(None, [v]) —
        // emit the plain value and let `get_values` synthesize the view.
        let elem_tag = p.peek_type()?;
        copy_scalar(p, b, elem_tag, &|slot| client.from_v0(slot))?;
        if p.next().map_err(|_| fail(Tag::Property, prop_offset))?.is_some() {
            return Err(fail(Tag::Property, prop_offset));
        }
    } else {
        let elem_tag = p.peek_type()?;
        b.open_choice(choice_type, 0)?;
        copy_scalar(p, b, elem_tag, &|slot| client.from_v0(slot))?;
        while p.next().map_err(|_| fail(Tag::Property, prop_offset))?.is_some() {
            copy_scalar(p, b, elem_tag, &|slot| client.from_v0(slot))?;
        }
        b.close()?;
    }
    p.leave()?;
    b.close()?;
    Ok(())
}

/// Rewrites one v2 POD tree at the parser's cursor into v0 form,
/// appending it to `b`. `client` must already be initialised (§5).
pub fn remap_to_v0(client: &ClientTypeTable, p: &mut Parser, b: &mut Builder) -> Result<()> {
    if !client.is_initialised() {
        return Err(Error::Uninitialised);
    }
    walk_to_v0(client, p, b)
}

fn walk_to_v0(client: &ClientTypeTable, p: &mut Parser, b: &mut Builder) -> Result<()> {
    let tag = p.peek_type()?;
    match tag {
        Tag::String => {
            let s = p.get_str()?;
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            b.primitive(Tag::String, &bytes)?;
        }
        Tag::Bytes => {
            let bytes = p.get_bytes()?.to_vec();
            b.primitive(Tag::Bytes, &bytes)?;
        }
        Tag::Array => {
            let ContainerInfo::Array { child_tag, child_size } = p.enter()? else {
                unreachable!()
            };
            b.open_array(child_tag, child_size)?;
            while p.next()?.is_some() {
                copy_scalar(p, b, child_tag, &|id| client.from_v2(id))?;
            }
            p.leave()?;
            b.close()?;
        }
        Tag::Struct => {
            p.enter()?;
            b.open_struct()?;
            while p.next()?.is_some() {
                walk_to_v0(client, p, b)?;
            }
            p.leave()?;
            b.close()?;
        }
        Tag::Object => remap_object_to_v0(client, p, b)?,
        Tag::None
        | Tag::Bool
        | Tag::Id
        | Tag::Int
        | Tag::Long
        | Tag::Float
        | Tag::Double
        | Tag::Fd
        | Tag::Rectangle
        | Tag::Fraction
        | Tag::Pointer => copy_scalar(p, b, tag, &|id| client.from_v2(id))?,
        other => return Err(fail(other, p.offset())),
    }
    Ok(())
}

fn remap_object_to_v0(client: &ClientTypeTable, p: &mut Parser, b: &mut Builder) -> Result<()> {
    let object_offset = p.offset();
    let ContainerInfo::Object { object_type: v2_type, object_id: v2_id } = p.enter()? else {
        unreachable!()
    };

    let (v0_type_slot, v0_id_slot) = if v2_type == COMMAND_OBJECT {
        let row = client
            .from_v2(v2_id)
            .ok_or_else(|| fail(Tag::Object, object_offset))?;
        (0u32, row)
    } else {
        let t = client
            .from_v2(v2_type)
            .ok_or_else(|| fail(Tag::Object, object_offset))?;
        let i = client
            .from_v2(v2_id)
            .ok_or_else(|| fail(Tag::Object, object_offset))?;
        (t, i)
    };
    // Swap back to v0's (id, type) wire order.
    b.open_object(v0_id_slot, v0_type_slot)?;

    while let Some(child_tag) = p.next()? {
        if child_tag != Tag::Property {
            return Err(fail(child_tag, p.offset()));
        }
        let prop = p.read_property()?;
        let mut value = prop.value;

        if v2_type == FORMAT_OBJECT && (prop.key == PROP_MEDIA_TYPE || prop.key == PROP_MEDIA_SUBTYPE) {
            let id_tag = value.peek_type()?;
            copy_scalar(&mut value, b, id_tag, &|id| client.from_v2(id))?;
            continue;
        }

        remap_prop_to_v0(client, prop.key, prop.flags, &mut value, b)?;
    }
    p.leave()?;
    b.close()?;
    Ok(())
}

/// Emits one v2 `Property`'s value back into a v0 object's child list.
///
/// A genuine `Choice` with a real discipline (anything but `None`)
/// becomes a v0 `Prop` (flat key/flags/default/alternatives). Everything
/// else — a plain scalar, or `Choice(None, [value])` — collapses to a
/// bare child with no wrapper at all, same as `remap_to_v0`'s explicit
/// Choice-None rule; §9's "Choice-None ambiguity" note means a value
/// that started as a synthesized (not genuinely keyed) v0 child is
/// indistinguishable from a downgraded Prop once in v2 form, so both
/// collapse back the same way.
fn remap_prop_to_v0(
    client: &ClientTypeTable,
    v2_key: u32,
    v2_flags: u32,
    value: &mut Parser,
    b: &mut Builder,
) -> Result<()> {
    let value_tag = value.peek_type()?;

    if value_tag == Tag::Choice {
        let ContainerInfo::Choice { choice_type, child_tag, .. } = value.enter()? else {
            unreachable!()
        };
        if choice_type == ChoiceType::None {
            value.next()?;
            copy_scalar(value, b, child_tag, &|id| client.from_v2(id))?;
            value.leave()?;
            return Ok(());
        }
        let v0_key = client.from_v2(v2_key).unwrap_or(v2_key);
        let v2_prop_flags = PropertyFlags::from_bits_truncate(v2_flags);
        let v0_flags: LegacyPropertyFlags =
            legacy_range_bits(choice_type) | LegacyPropertyFlags::from(v2_prop_flags);
        let mut prefix = [0u8; 8];
        prefix[0..4].copy_from_slice(&v0_key.to_le_bytes());
        prefix[4..8].copy_from_slice(&v0_flags.bits().to_le_bytes());
        b.open_tagged(Tag::Property, &prefix)?;
        while value.next()?.is_some() {
            copy_scalar(value, b, child_tag, &|id| client.from_v2(id))?;
        }
        b.close()?;
        value.leave()?;
    } else {
        copy_scalar(value, b, value_tag, &|id| client.from_v2(id))?;
    }
    Ok(())
}
