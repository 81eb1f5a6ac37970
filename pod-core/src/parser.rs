//! Structural cursor over an existing POD tree (§4.C).
//!
//! Grounded on `fuel-types::canonical::Input` (`read`/`read_byte`/`skip`/
//! `remaining`) for the bounds-checked cursor shape, adapted from a
//! streaming `Input` trait to a slice-backed cursor since POD trees are
//! always fully materialized before parsing (§6 "Decoder source: a
//! contiguous byte slice").

use alloc::vec::Vec;

use crate::error::{Error, MalformedReason};
use crate::layout::{align8, Header, HEADER_LEN};
use crate::tag::Tag;
use crate::value::ChoiceType;

/// Bookkeeping for one open container (`enter`ed but not yet `leave`d).
struct ContainerFrame {
    /// Absolute end of this container's body in the backing buffer.
    end: usize,
    tag: Tag,
}

/// Type-checked cursor over a byte slice containing a POD tree.
///
/// Scalar reads copy their value out and advance past header + body +
/// padding; `enter`/`leave` open and close containers; `next` advances to
/// the following sibling or reports `End`. The parser never allocates —
/// it only ever borrows from the buffer it was constructed with.
pub struct Parser<'a> {
    buf: &'a [u8],
    /// Absolute offset of the cursor (next unread byte).
    pos: usize,
    stack: Vec<ContainerFrame>,
}

/// Sentinel returned by [`Parser::next`] when a container is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct End;

impl<'a> Parser<'a> {
    /// Wraps `buf`, positioned at byte 0, ready to read a single POD
    /// header (or `enter` it, if it is a container).
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            stack: Vec::new(),
        }
    }

    /// Absolute offset of the cursor, used to annotate errors.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn container_end(&self) -> usize {
        self.stack.last().map(|f| f.end).unwrap_or(self.buf.len())
    }

    fn remaining(&self) -> usize {
        self.container_end().saturating_sub(self.pos)
    }

    /// Reads the header at the cursor without advancing.
    fn peek_header(&self) -> Result<Header, Error> {
        let end = self.container_end();
        if self.pos > end {
            return Err(Error::Malformed {
                offset: self.pos,
                reason: MalformedReason::BodyOverrun,
            });
        }
        let slice = &self.buf[self.pos..end];
        Header::read(slice, self.pos)
    }

    /// Tag of the value at the cursor, without advancing.
    pub fn peek_type(&self) -> Result<Tag, Error> {
        Ok(self.peek_header()?.tag)
    }

    fn body_range(&self, header: &Header) -> (usize, usize) {
        let body_start = self.pos + HEADER_LEN;
        let body_end = body_start + header.size as usize;
        (body_start, body_end)
    }

    fn expect_header(&mut self, expected: Tag) -> Result<(usize, usize), Error> {
        let header = self.peek_header()?;
        if header.tag != expected {
            return Err(Error::TypeMismatch {
                expected,
                found: header.tag,
            });
        }
        let (body_start, body_end) = self.body_range(&header);
        self.pos += HEADER_LEN + align8(header.size as usize);
        Ok((body_start, body_end))
    }

    fn read_fixed<const N: usize>(&mut self, expected: Tag) -> Result<[u8; N], Error> {
        let (start, end) = self.expect_header(expected)?;
        if end - start != N {
            return Err(Error::Malformed {
                offset: start,
                reason: MalformedReason::BodyOverrun,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[start..end]);
        Ok(out)
    }

    /// Reads a `None` value, advancing past it.
    pub fn get_none(&mut self) -> Result<(), Error> {
        self.expect_header(Tag::None)?;
        Ok(())
    }

    /// Reads a `Bool`.
    pub fn get_bool(&mut self) -> Result<bool, Error> {
        let bytes = self.read_fixed::<4>(Tag::Bool)?;
        Ok(u32::from_le_bytes(bytes) != 0)
    }

    /// Reads an `Id`.
    pub fn get_id(&mut self) -> Result<u32, Error> {
        let bytes = self.read_fixed::<4>(Tag::Id)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads an `Int`.
    pub fn get_i32(&mut self) -> Result<i32, Error> {
        let bytes = self.read_fixed::<4>(Tag::Int)?;
        Ok(i32::from_le_bytes(bytes))
    }

    /// Reads a `Long`.
    pub fn get_i64(&mut self) -> Result<i64, Error> {
        let bytes = self.read_fixed::<8>(Tag::Long)?;
        Ok(i64::from_le_bytes(bytes))
    }

    /// Reads a `Float`.
    pub fn get_f32(&mut self) -> Result<f32, Error> {
        let bytes = self.read_fixed::<4>(Tag::Float)?;
        Ok(f32::from_le_bytes(bytes))
    }

    /// Reads a `Double`.
    pub fn get_f64(&mut self) -> Result<f64, Error> {
        let bytes = self.read_fixed::<8>(Tag::Double)?;
        Ok(f64::from_le_bytes(bytes))
    }

    /// Reads a `Fd`.
    pub fn get_fd(&mut self) -> Result<i64, Error> {
        let bytes = self.read_fixed::<8>(Tag::Fd)?;
        Ok(i64::from_le_bytes(bytes))
    }

    /// Reads a `Rectangle` as `(width, height)`.
    pub fn get_rectangle(&mut self) -> Result<(u32, u32), Error> {
        let bytes = self.read_fixed::<8>(Tag::Rectangle)?;
        Ok((
            u32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
        ))
    }

    /// Reads a `Fraction` as `(num, denom)`.
    pub fn get_fraction(&mut self) -> Result<(u32, u32), Error> {
        let bytes = self.read_fixed::<8>(Tag::Fraction)?;
        Ok((
            u32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
        ))
    }

    /// Reads a `Pointer` as `(type, opaque)`.
    pub fn get_pointer(&mut self) -> Result<(u32, u64), Error> {
        let bytes = self.read_fixed::<16>(Tag::Pointer)?;
        let pointer_type = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let opaque = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        Ok((pointer_type, opaque))
    }

    /// Reads a `String`, returning the UTF-8 text without its trailing
    /// NUL (I7). Borrows from the underlying buffer.
    pub fn get_str(&mut self) -> Result<&'a str, Error> {
        let (start, end) = self.expect_header(Tag::String)?;
        if end <= start {
            return Err(Error::Malformed {
                offset: start,
                reason: MalformedReason::ShortString,
            });
        }
        let bytes = &self.buf[start..end];
        if bytes[bytes.len() - 1] != 0 {
            return Err(Error::Malformed {
                offset: start,
                reason: MalformedReason::ShortString,
            });
        }
        core::str::from_utf8(&bytes[..bytes.len() - 1]).map_err(|_| Error::Malformed {
            offset: start,
            reason: MalformedReason::ShortString,
        })
    }

    /// Reads a `Bytes` body. Borrows from the underlying buffer.
    pub fn get_bytes(&mut self) -> Result<&'a [u8], Error> {
        let (start, end) = self.expect_header(Tag::Bytes)?;
        Ok(&self.buf[start..end])
    }

    /// Enters a container (`Struct`, `Array`, `Object`, `Choice`, or
    /// `Sequence`), pushing a frame so that subsequent [`Parser::next`]
    /// calls iterate its children. Returns the container's tag and, for
    /// `Object`, `(object_type, object_id)`, and for `Array`/`Choice`,
    /// `(child_type, child_size)`.
    pub fn enter(&mut self) -> Result<ContainerInfo, Error> {
        let header = self.peek_header()?;
        let (body_start, body_end) = self.body_range(&header);
        let info = match header.tag {
            Tag::Struct => {
                self.pos = body_start;
                ContainerInfo::Struct
            }
            Tag::Sequence => {
                if body_end - body_start < 8 {
                    return Err(Error::Malformed {
                        offset: body_start,
                        reason: MalformedReason::BodyOverrun,
                    });
                }
                let unit = u32::from_le_bytes(self.buf[body_start..body_start + 4].try_into().unwrap());
                self.pos = body_start + 8;
                ContainerInfo::Sequence { unit }
            }
            Tag::Object => {
                if body_end - body_start < 8 {
                    return Err(Error::Malformed {
                        offset: body_start,
                        reason: MalformedReason::BodyOverrun,
                    });
                }
                let object_type =
                    u32::from_le_bytes(self.buf[body_start..body_start + 4].try_into().unwrap());
                let object_id =
                    u32::from_le_bytes(self.buf[body_start + 4..body_start + 8].try_into().unwrap());
                self.pos = body_start + 8;
                ContainerInfo::Object {
                    object_type,
                    object_id,
                }
            }
            Tag::Property => {
                if body_end - body_start < 8 {
                    return Err(Error::Malformed {
                        offset: body_start,
                        reason: MalformedReason::BodyOverrun,
                    });
                }
                let key = u32::from_le_bytes(self.buf[body_start..body_start + 4].try_into().unwrap());
                let flags =
                    u32::from_le_bytes(self.buf[body_start + 4..body_start + 8].try_into().unwrap());
                self.pos = body_start + 8;
                ContainerInfo::Property { key, flags }
            }
            Tag::Array | Tag::Choice => {
                let sub_header_len = if header.tag == Tag::Choice { 16 } else { 8 };
                if body_end - body_start < sub_header_len {
                    return Err(Error::Malformed {
                        offset: body_start,
                        reason: MalformedReason::BodyOverrun,
                    });
                }
                let (child_size_off, child_type_off) = if header.tag == Tag::Choice {
                    (body_start + 8, body_start + 12)
                } else {
                    (body_start, body_start + 4)
                };
                let child_size = u32::from_le_bytes(
                    self.buf[child_size_off..child_size_off + 4].try_into().unwrap(),
                ) as usize;
                let child_type_word = u32::from_le_bytes(
                    self.buf[child_type_off..child_type_off + 4].try_into().unwrap(),
                );
                let child_tag = Tag::from_u32(child_type_word).ok_or(Error::Malformed {
                    offset: child_type_off,
                    reason: MalformedReason::UnknownTag,
                })?;
                self.pos = body_start + sub_header_len;
                if header.tag == Tag::Array {
                    ContainerInfo::Array { child_tag, child_size }
                } else {
                    let choice_type_word = u32::from_le_bytes(
                        self.buf[body_start..body_start + 4].try_into().unwrap(),
                    );
                    let choice_type = ChoiceType::from_u32(choice_type_word).ok_or(Error::Malformed {
                        offset: body_start,
                        reason: MalformedReason::UnknownTag,
                    })?;
                    let flags = u32::from_le_bytes(
                        self.buf[body_start + 4..body_start + 8].try_into().unwrap(),
                    );
                    ContainerInfo::Choice {
                        choice_type,
                        flags,
                        child_tag,
                        child_size,
                    }
                }
            }
            other => {
                return Err(Error::TypeMismatch {
                    expected: Tag::Struct,
                    found: other,
                })
            }
        };
        self.stack.push(ContainerFrame {
            end: body_end,
            tag: header.tag,
        });
        Ok(info)
    }

    /// Closes the innermost open container. Fails with [`Error::Shape`]
    /// if children remain unread or no container is open — callers
    /// should drain with [`Parser::next`] until [`End`] first.
    pub fn leave(&mut self) -> Result<(), Error> {
        let frame = self.stack.pop().ok_or(Error::Shape("leave() with no open container"))?;
        if self.pos != frame.end {
            // Not fully consumed: skip to the end so the cursor still
            // lands exactly at "8 + align8(size)" bytes consumed, per §8.
            self.pos = frame.end;
        }
        let _ = frame.tag;
        Ok(())
    }

    /// Advances to the next child of the innermost open container, or
    /// returns `Ok(None)` (the `End` sentinel, §4.C) once it is
    /// exhausted. For `Object` containers this behaves identically to
    /// walking `Property` children in encounter order.
    pub fn next(&mut self) -> Result<Option<Tag>, Error> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        let tag = self.peek_type()?;
        Ok(Some(tag))
    }

    /// Reads one `(offset, type, body)` control entry from the innermost
    /// open `Sequence`, advancing past it; `Ok(None)` once the sequence is
    /// exhausted. A `Sequence`'s children are not POD headers — they carry
    /// a timestamp `offset` where a generic POD carries `size` (§4.B
    /// `push_control`) — so this reads the flat layout directly rather
    /// than going through [`Parser::next`]'s `(size, type)` header parse,
    /// which would misread `offset` as a body size.
    pub fn next_control(&mut self) -> Result<Option<(u32, Tag, &'a [u8])>, Error> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        if self.remaining() < 8 {
            return Err(Error::Malformed {
                offset: self.pos,
                reason: MalformedReason::TruncatedHeader,
            });
        }
        let offset = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        let type_word = u32::from_le_bytes(self.buf[self.pos + 4..self.pos + 8].try_into().unwrap());
        let tag = Tag::from_u32(type_word).ok_or(Error::Malformed {
            offset: self.pos + 4,
            reason: MalformedReason::UnknownTag,
        })?;
        let body_size = tag.fixed_body_size().ok_or(Error::Malformed {
            offset: self.pos + 4,
            reason: MalformedReason::UnknownTag,
        })?;
        let body_start = self.pos + 8;
        let body_end = body_start + body_size;
        if body_end > self.container_end() {
            return Err(Error::Malformed {
                offset: body_start,
                reason: MalformedReason::BodyOverrun,
            });
        }
        self.pos = body_end;
        Ok(Some((offset, tag, &self.buf[body_start..body_end])))
    }

    /// Linear scan for the first `Property` with the given `key` inside
    /// the `Object` currently entered (I6: first match wins). Leaves the
    /// cursor inside the object, positioned after the returned property,
    /// so callers may keep scanning.
    pub fn find_prop(&mut self, key: u32) -> Result<Option<PropertyView<'a>>, Error> {
        loop {
            match self.next()? {
                None => return Ok(None),
                Some(tag) => {
                    if tag != Tag::Property {
                        return Err(Error::Malformed {
                            offset: self.pos,
                            reason: MalformedReason::NonPropertyInObject,
                        });
                    }
                    let prop = self.read_property()?;
                    if prop.key == key {
                        return Ok(Some(prop));
                    }
                }
            }
        }
    }

    /// Reads the `Property` at the cursor (`enter`s it implicitly),
    /// returning its key, flags, and a sub-parser positioned at its
    /// value. Advances past the whole property.
    pub fn read_property(&mut self) -> Result<PropertyView<'a>, Error> {
        let header = self.peek_header()?;
        if header.tag != Tag::Property {
            return Err(Error::TypeMismatch {
                expected: Tag::Property,
                found: header.tag,
            });
        }
        let (body_start, body_end) = self.body_range(&header);
        if body_end - body_start < 8 {
            return Err(Error::Malformed {
                offset: body_start,
                reason: MalformedReason::BodyOverrun,
            });
        }
        let key = u32::from_le_bytes(self.buf[body_start..body_start + 4].try_into().unwrap());
        let flags = u32::from_le_bytes(self.buf[body_start + 4..body_start + 8].try_into().unwrap());
        let value_bytes = &self.buf[body_start + 8..body_end];
        self.pos += HEADER_LEN + align8(header.size as usize);
        Ok(PropertyView {
            key,
            flags,
            value: Parser::new(value_bytes),
        })
    }
}

/// Decoded container header, returned by [`Parser::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerInfo {
    /// Plain `Struct`: arbitrary children.
    Struct,
    /// `Array`: homogeneous children of `child_tag`/`child_size`.
    Array { child_tag: Tag, child_size: usize },
    /// `Object`: `(object_type, object_id)`.
    Object { object_type: u32, object_id: u32 },
    /// `Property`/legacy `Prop`, entered generically: `(key, flags)`
    /// followed by arbitrary children (one value in v2, a default plus
    /// alternatives in v0 — see `pod-protocol`'s remap).
    Property { key: u32, flags: u32 },
    /// `Choice`: discipline plus homogeneous element type.
    Choice {
        choice_type: ChoiceType,
        flags: u32,
        child_tag: Tag,
        child_size: usize,
    },
    /// `Sequence`: timestamped control stream.
    Sequence { unit: u32 },
}

/// A decoded `Property`: key, flags, and a parser positioned at its
/// value (which may itself be a `Choice`, per §4.D).
pub struct PropertyView<'a> {
    /// Property key.
    pub key: u32,
    /// Raw v2 flag bitmask (callers decide which flag type applies).
    pub flags: u32,
    /// Parser positioned at the property's value.
    pub value: Parser<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use proptest::prelude::*;

    fn build_scenario_1(buf: &mut [u8]) -> usize {
        let mut b = Builder::new(buf);
        b.open_struct().unwrap();
        b.primitive(Tag::Int, &4i32.to_le_bytes()).unwrap();
        b.primitive(Tag::Long, &6000i64.to_le_bytes()).unwrap();
        b.primitive(Tag::Float, &4.0f32.to_le_bytes()).unwrap();
        b.primitive(Tag::Double, &3.14f64.to_le_bytes()).unwrap();

        // String("test123")
        let mut s = alloc::vec::Vec::from(*b"test123");
        s.push(0);
        b.primitive(Tag::String, &s).unwrap();

        b.primitive(Tag::Rectangle, &[320u32.to_le_bytes(), 240u32.to_le_bytes()].concat())
            .unwrap();
        b.primitive(Tag::Fraction, &[25u32.to_le_bytes(), 1u32.to_le_bytes()].concat())
            .unwrap();

        b.open_array(Tag::Int, 4).unwrap();
        for v in [4i32, 5, 6] {
            b.primitive(Tag::Int, &v.to_le_bytes()).unwrap();
        }
        b.close().unwrap();

        b.close().unwrap();
        b.len()
    }

    #[test]
    fn scenario_1_primitive_round_trip() {
        let mut buf = [0u8; 512];
        let len = build_scenario_1(&mut buf);

        let mut p = Parser::new(&buf[..len]);
        p.enter().unwrap();
        assert_eq!(p.get_i32().unwrap(), 4);
        assert_eq!(p.get_i64().unwrap(), 6000);
        assert_eq!(p.get_f32().unwrap(), 4.0);
        assert_eq!(p.get_f64().unwrap(), 3.14);
        assert_eq!(p.get_str().unwrap(), "test123");
        assert_eq!(p.get_rectangle().unwrap(), (320, 240));
        assert_eq!(p.get_fraction().unwrap(), (25, 1));

        let info = p.enter().unwrap();
        assert_eq!(
            info,
            ContainerInfo::Array {
                child_tag: Tag::Int,
                child_size: 4,
            }
        );
        assert_eq!(p.get_i32().unwrap(), 4);
        assert_eq!(p.get_i32().unwrap(), 5);
        assert_eq!(p.get_i32().unwrap(), 6);
        assert_eq!(p.next().unwrap(), None);
        p.leave().unwrap();
        p.leave().unwrap();
    }

    #[test]
    fn scenario_2_object_property_lookup() {
        let mut buf = [0u8; 512];
        let mut b = Builder::new(&mut buf);
        b.open_object(0, 0).unwrap();

        b.open_property(1, 0).unwrap();
        b.open_choice(ChoiceType::Enum, 0).unwrap();
        b.primitive(Tag::Int, &1i32.to_le_bytes()).unwrap();
        b.primitive(Tag::Int, &2i32.to_le_bytes()).unwrap();
        b.close().unwrap();
        b.close().unwrap();

        b.open_property(2, 0).unwrap();
        b.primitive(Tag::Int, &42i32.to_le_bytes()).unwrap();
        b.close().unwrap();

        b.open_property(3, 0).unwrap();
        b.open_choice(ChoiceType::Range, 0).unwrap();
        b.primitive(Tag::Rectangle, &[320u32.to_le_bytes(), 240u32.to_le_bytes()].concat())
            .unwrap();
        b.primitive(Tag::Rectangle, &[0u32.to_le_bytes(), 0u32.to_le_bytes()].concat())
            .unwrap();
        b.primitive(
            Tag::Rectangle,
            &[1024u32.to_le_bytes(), 1024u32.to_le_bytes()].concat(),
        )
        .unwrap();
        b.close().unwrap();
        b.close().unwrap();

        b.close().unwrap();
        let len = b.len();

        let mut p = Parser::new(&buf[..len]);
        let ContainerInfo::Object { object_type, object_id } = p.enter().unwrap() else {
            panic!("expected object")
        };
        assert_eq!((object_type, object_id), (0, 0));

        let found = p.find_prop(2).unwrap().expect("property 2 present");
        assert_eq!(found.key, 2);
        let mut value = found.value;
        assert_eq!(value.get_i32().unwrap(), 42);
    }

    #[test]
    fn scenario_3_malformed_rejection() {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&1000u32.to_le_bytes());
        buf[4..8].copy_from_slice(&(Tag::Int as u32).to_le_bytes());
        let p = Parser::new(&buf);
        let err = p.peek_type().unwrap_err();
        assert_eq!(
            err,
            Error::Malformed {
                offset: 0,
                reason: MalformedReason::BodyOverrun,
            }
        );
    }

    #[test]
    fn sequence_control_entries_round_trip() {
        let mut buf = [0u8; 128];
        let mut b = Builder::new(&mut buf);
        b.open_sequence(1).unwrap();
        b.push_control(0, Tag::Int, &4i32.to_le_bytes()).unwrap();
        b.push_control(100, Tag::Int, &5i32.to_le_bytes()).unwrap();
        b.close().unwrap();
        let len = b.len();

        let mut p = Parser::new(&buf[..len]);
        let ContainerInfo::Sequence { unit } = p.enter().unwrap() else {
            panic!("expected a sequence")
        };
        assert_eq!(unit, 1);

        let (offset, tag, body) = p.next_control().unwrap().expect("first control entry");
        assert_eq!(offset, 0);
        assert_eq!(tag, Tag::Int);
        assert_eq!(i32::from_le_bytes(body.try_into().unwrap()), 4);

        let (offset, tag, body) = p.next_control().unwrap().expect("second control entry");
        assert_eq!(offset, 100);
        assert_eq!(tag, Tag::Int);
        assert_eq!(i32::from_le_bytes(body.try_into().unwrap()), 5);

        assert!(p.next_control().unwrap().is_none());
        p.leave().unwrap();
    }

    proptest! {
        /// §8: a Parser positioned at a valid POD consumes exactly
        /// `8 + align8(size)` bytes — here, a single primitive inside a
        /// Struct whose own trailing byte we can see was left untouched.
        #[test]
        fn get_i32_consumes_exactly_header_plus_aligned_body(v in any::<i32>(), trailer in 0u8..=255) {
            let mut buf = [0u8; 32];
            let mut b = Builder::new(&mut buf);
            b.open_struct().unwrap();
            b.primitive(Tag::Int, &v.to_le_bytes()).unwrap();
            b.close().unwrap();
            let len = b.len();
            buf[len] = trailer;

            let mut p = Parser::new(&buf[..len + 1]);
            p.enter().unwrap();
            let before = p.offset();
            let got = p.get_i32().unwrap();
            let consumed = p.offset() - before;
            prop_assert_eq!(got, v);
            prop_assert_eq!(consumed, crate::layout::total_len(4));
            prop_assert_eq!(buf[len], trailer);
        }
    }
}
