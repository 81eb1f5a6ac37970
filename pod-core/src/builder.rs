//! Append-only construction of POD trees (§4.B).
//!
//! Grounded on `fuel-types::canonical::Output` (`write`/`push_byte` sink
//! abstraction) for the idea of a trait-free byte sink, adapted here into
//! a concrete `Builder` over `&mut [u8]` because POD's size fields must
//! be patched in after the fact rather than streamed length-first like
//! `Vec<T>::encode_static`.

use alloc::vec::Vec;

use crate::error::Error;
use crate::layout::{align8, padding_for, Header, HEADER_LEN};
use crate::tag::Tag;
use crate::value::ChoiceType;

#[derive(Debug)]
enum FrameKind {
    Struct,
    Object,
    /// Legal only when the enclosing frame is `Object` (I3).
    Property {
        children_pushed: usize,
    },
    Array {
        child_tag: Tag,
        child_size: usize,
    },
    Choice {
        choice_type: ChoiceType,
        flags: u32,
        /// Offset of the 16-byte `(choice_type, flags, child_size,
        /// child_type)` sub-header, patched at `close()` alongside the
        /// outer size — the child type/size are only known once the
        /// first element is pushed.
        sub_header_at: usize,
        child_tag: Option<Tag>,
        child_size: Option<usize>,
        count: usize,
    },
    Sequence,
    /// A container tagged `tag` with no structural rule of its own beyond
    /// "arbitrary children, one after another". Used by callers (e.g. the
    /// v0 legacy `Prop` framing in `pod-protocol`) whose wire shape does
    /// not match any of the named `open_*` containers above.
    Tagged(Tag),
}

struct Frame {
    /// Offset of this frame's outer POD header.
    start: usize,
    kind: FrameKind,
}

/// Append-only encoder over a caller-supplied byte buffer.
///
/// Binds to a buffer of known capacity and maintains a stack of open
/// frames (§4.B). On overflow, continues advancing its logical cursor so
/// that sizes stay correct but stops writing bytes (§4.B "Overflow");
/// `close()` of the outermost frame then reports the capacity that would
/// have been sufficient.
pub struct Builder<'a> {
    buf: &'a mut [u8],
    cursor: usize,
    frames: Vec<Frame>,
}

impl<'a> Builder<'a> {
    /// Binds a new builder to `buf`. The buffer need not be zeroed;
    /// every byte the builder emits is written explicitly, including
    /// alignment padding (I1).
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            cursor: 0,
            frames: Vec::new(),
        }
    }

    /// Bytes written (or that would have been written, past overflow) so
    /// far. Equals the final message length once the outermost frame is
    /// closed without overflow.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// True once nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        let buf_len = self.buf.len();
        if offset >= buf_len {
            return;
        }
        let end = (offset + bytes.len()).min(buf_len);
        let fit = end - offset;
        self.buf[offset..end].copy_from_slice(&bytes[..fit]);
    }

    fn append(&mut self, bytes: &[u8]) {
        self.write_at(self.cursor, bytes);
        self.cursor += bytes.len();
    }

    fn append_zeros(&mut self, n: usize) {
        for _ in 0..n {
            self.append(&[0u8]);
        }
    }

    /// Fails with [`Error::Shape`] unless the caller is allowed to push a
    /// raw child into the current top frame right now.
    fn check_can_push_child(&self) -> Result<(), Error> {
        match self.frames.last() {
            None => Ok(()),
            Some(frame) => match &frame.kind {
                FrameKind::Object => Err(Error::Shape(
                    "object children must be pushed via open_property (I3)",
                )),
                FrameKind::Property { children_pushed } if *children_pushed >= 1 => {
                    Err(Error::Shape("property already has a value"))
                }
                FrameKind::Sequence => Err(Error::Shape(
                    "sequence children must be pushed via push_control",
                )),
                _ => Ok(()),
            },
        }
    }

    fn on_child_pushed(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            if let FrameKind::Property { children_pushed } = &mut frame.kind {
                *children_pushed += 1;
            }
        }
    }

    fn open_header(&mut self, tag: Tag) -> usize {
        let start = self.cursor;
        let header = Header { size: 0, tag };
        let mut bytes = [0u8; HEADER_LEN];
        header.write(&mut bytes);
        self.append(&bytes);
        start
    }

    /// Opens a `Struct` frame: a sequence of arbitrary tagged children.
    pub fn open_struct(&mut self) -> Result<(), Error> {
        self.check_can_push_child()?;
        let start = self.open_header(Tag::Struct);
        self.on_child_pushed();
        self.frames.push(Frame {
            start,
            kind: FrameKind::Struct,
        });
        Ok(())
    }

    /// Opens an `Array` frame. `child_type` must be a fixed-size tag
    /// (I4); everything pushed until the matching `close()` must be that
    /// tag with exactly `child_size` bytes of body.
    pub fn open_array(&mut self, child_type: Tag, child_size: usize) -> Result<(), Error> {
        self.check_can_push_child()?;
        if child_type.fixed_body_size() != Some(child_size) {
            return Err(Error::Shape(
                "array child type must be a fixed-size primitive matching child_size",
            ));
        }
        let start = self.open_header(Tag::Array);
        self.append(&(child_size as u32).to_le_bytes());
        self.append(&(child_type as u32).to_le_bytes());
        self.on_child_pushed();
        self.frames.push(Frame {
            start,
            kind: FrameKind::Array {
                child_tag: child_type,
                child_size,
            },
        });
        Ok(())
    }

    /// Opens an `Object` frame. Every direct child must be pushed via
    /// [`Builder::open_property`] (I3).
    pub fn open_object(&mut self, object_type: u32, object_id: u32) -> Result<(), Error> {
        self.check_can_push_child()?;
        let start = self.open_header(Tag::Object);
        self.append(&object_type.to_le_bytes());
        self.append(&object_id.to_le_bytes());
        self.on_child_pushed();
        self.frames.push(Frame {
            start,
            kind: FrameKind::Object,
        });
        Ok(())
    }

    /// Opens a `Property` frame. Legal only when the enclosing frame is
    /// an `Object`.
    pub fn open_property(&mut self, key: u32, flags: u32) -> Result<(), Error> {
        match self.frames.last() {
            Some(frame) if matches!(frame.kind, FrameKind::Object) => {}
            _ => return Err(Error::Shape("open_property requires an enclosing object")),
        }
        let start = self.open_header(Tag::Property);
        self.append(&key.to_le_bytes());
        self.append(&flags.to_le_bytes());
        self.frames.push(Frame {
            start,
            kind: FrameKind::Property { children_pushed: 0 },
        });
        Ok(())
    }

    /// Opens a `Choice` frame. `child_type`/`child_size` are not known
    /// upfront (unlike `open_array`): they are inferred from the first
    /// element pushed and patched into the reserved sub-header alongside
    /// the outer size when [`Builder::close`] runs.
    pub fn open_choice(&mut self, choice_type: ChoiceType, flags: u32) -> Result<(), Error> {
        self.check_can_push_child()?;
        let start = self.open_header(Tag::Choice);
        let sub_header_at = self.cursor;
        // Reserve (choice_type, flags, child_size, child_type); choice_type
        // and flags are known now, the rest are placeholders.
        self.append(&(choice_type as u32).to_le_bytes());
        self.append(&flags.to_le_bytes());
        self.append(&0u32.to_le_bytes());
        self.append(&0u32.to_le_bytes());
        self.on_child_pushed();
        self.frames.push(Frame {
            start,
            kind: FrameKind::Choice {
                choice_type,
                flags,
                sub_header_at,
                child_tag: None,
                child_size: None,
                count: 0,
            },
        });
        Ok(())
    }

    /// Opens a frame tagged `tag` accepting arbitrary children, for wire
    /// shapes none of the named `open_*` containers cover. `prefix` is
    /// written immediately after the header (e.g. a legacy key/flags pair)
    /// before any children.
    pub fn open_tagged(&mut self, tag: Tag, prefix: &[u8]) -> Result<(), Error> {
        self.check_can_push_child()?;
        let start = self.open_header(tag);
        self.append(prefix);
        self.on_child_pushed();
        self.frames.push(Frame {
            start,
            kind: FrameKind::Tagged(tag),
        });
        Ok(())
    }

    /// Opens a `Sequence` frame: a timestamped control stream.
    pub fn open_sequence(&mut self, unit: u32) -> Result<(), Error> {
        self.check_can_push_child()?;
        let start = self.open_header(Tag::Sequence);
        self.append(&unit.to_le_bytes());
        self.append(&0u32.to_le_bytes()); // pad
        self.on_child_pushed();
        self.frames.push(Frame {
            start,
            kind: FrameKind::Sequence,
        });
        Ok(())
    }

    /// Appends one `(offset, type, body)` control entry to the
    /// innermost open `Sequence` frame.
    pub fn push_control(&mut self, offset: u32, tag: Tag, body: &[u8]) -> Result<(), Error> {
        match self.frames.last() {
            Some(frame) if matches!(frame.kind, FrameKind::Sequence) => {}
            _ => return Err(Error::Shape("push_control requires an open sequence")),
        }
        if tag.fixed_body_size() != Some(body.len()) {
            return Err(Error::Shape("sequence control body size mismatch"));
        }
        self.append(&offset.to_le_bytes());
        self.append(&(tag as u32).to_le_bytes());
        self.append(body);
        Ok(())
    }

    /// Writes a tagged primitive.
    ///
    /// Inside a `Struct`/`Object`-via-`Property` context this emits a
    /// full `8 + align8(size)` POD (header, body, padding). Inside an
    /// `Array`/`Choice` frame it instead validates `t`/`bytes` against
    /// the container's homogeneity rule and appends only the raw body,
    /// since the per-element tag is implied by the container (§4.B
    /// `raw`).
    pub fn primitive(&mut self, t: Tag, bytes: &[u8]) -> Result<(), Error> {
        match self.frames.last_mut() {
            Some(Frame {
                kind: FrameKind::Array { child_tag, child_size },
                ..
            }) => {
                if t != *child_tag || bytes.len() != *child_size {
                    return Err(Error::Shape(
                        "array element type/size does not match the declared child type (I4)",
                    ));
                }
                self.raw(bytes);
                return Ok(());
            }
            Some(Frame {
                kind:
                    FrameKind::Choice {
                        child_tag,
                        child_size,
                        count,
                        ..
                    },
                ..
            }) => {
                match (*child_tag, *child_size) {
                    (Some(established_tag), Some(established_size)) => {
                        if t != established_tag || bytes.len() != established_size {
                            return Err(Error::Shape(
                                "choice element type/size does not match the first element (I4)",
                            ));
                        }
                    }
                    _ => {
                        if t.fixed_body_size() != Some(bytes.len()) {
                            return Err(Error::Shape(
                                "choice element type must be a fixed-size primitive",
                            ));
                        }
                        *child_tag = Some(t);
                        *child_size = Some(bytes.len());
                    }
                }
                *count += 1;
                self.raw(bytes);
                return Ok(());
            }
            _ => {}
        }
        self.check_can_push_child()?;
        let header = Header {
            size: bytes.len() as u32,
            tag: t,
        };
        let mut header_bytes = [0u8; HEADER_LEN];
        header.write(&mut header_bytes);
        self.append(&header_bytes);
        self.append(bytes);
        self.append_zeros(padding_for(bytes.len()));
        self.on_child_pushed();
        Ok(())
    }

    /// Appends raw bytes without tagging. Used inside `Array`/`Choice`
    /// element streams where the tag is implied by the container; most
    /// callers should prefer [`Builder::primitive`], which validates
    /// homogeneity before delegating here.
    pub fn raw(&mut self, bytes: &[u8]) {
        self.append(bytes);
    }

    /// Pops the topmost frame, patches its size (and, for `Choice`, its
    /// deferred child sub-header) behind the cursor, and emits alignment
    /// padding. This is the only operation that writes behind the
    /// cursor (§4.B "Patch semantics").
    ///
    /// Returns the frame's body size on success. If this closed the
    /// outermost frame and the buffer was too small, returns
    /// [`Error::Overflow`] with the capacity that would have sufficed —
    /// the caller may retry with a fresh, larger buffer.
    pub fn close(&mut self) -> Result<u32, Error> {
        let frame = self
            .frames
            .pop()
            .ok_or(Error::Shape("close() with no open frame"))?;

        if let FrameKind::Choice {
            choice_type, count, ..
        } = &frame.kind
        {
            let min = choice_type.min_elements();
            let ok = match choice_type {
                ChoiceType::None => *count == 1,
                ChoiceType::Range => *count == 3,
                ChoiceType::Step => *count == 4,
                ChoiceType::Enum | ChoiceType::Flags => *count >= min,
            };
            if !ok {
                return Err(Error::Shape(
                    "choice element count does not satisfy its choice_type (§3)",
                ));
            }
        }

        let body_end = self.cursor;
        let body_size = body_end - frame.start - HEADER_LEN;
        let pad = padding_for(body_size);
        self.append_zeros(pad);

        let header = Header {
            size: body_size as u32,
            tag: match &frame.kind {
                FrameKind::Struct => Tag::Struct,
                FrameKind::Object => Tag::Object,
                FrameKind::Property { .. } => Tag::Property,
                FrameKind::Array { .. } => Tag::Array,
                FrameKind::Choice { .. } => Tag::Choice,
                FrameKind::Sequence => Tag::Sequence,
                FrameKind::Tagged(tag) => *tag,
            },
        };
        let mut header_bytes = [0u8; HEADER_LEN];
        header.write(&mut header_bytes);
        self.write_at(frame.start, &header_bytes);

        if let FrameKind::Choice {
            choice_type,
            flags,
            sub_header_at,
            child_tag,
            child_size,
            ..
        } = &frame.kind
        {
            let mut sub = [0u8; 16];
            sub[0..4].copy_from_slice(&(*choice_type as u32).to_le_bytes());
            sub[4..8].copy_from_slice(&flags.to_le_bytes());
            sub[8..12].copy_from_slice(&(child_size.unwrap_or(0) as u32).to_le_bytes());
            let child_type_word = child_tag.map(|t| t as u32).unwrap_or(0);
            sub[12..16].copy_from_slice(&child_type_word.to_le_bytes());
            self.write_at(*sub_header_at, &sub);
        }

        if self.frames.is_empty() && self.cursor > self.buf.len() {
            return Err(Error::Overflow {
                required: self.cursor,
            });
        }

        Ok(body_size as u32)
    }
}
