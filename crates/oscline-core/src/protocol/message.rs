//! Message parsing (zero-copy, panic-free).
//!
//! Parsing rules:
//! - The parser borrows the packet; strings and blobs are returned as views
//!   into it, never copied.
//! - Two cursors: the type cursor walks the type string, the data cursor
//!   walks the argument payloads. No-payload tags move only the former.
//! - A failed read leaves both cursors untouched.

use std::fmt;

use bytes::Buf;

use crate::error::{OscError, Result};
use crate::protocol::align::{align4, find_nul, slice_at};
use crate::protocol::tag::{ArgKind, RawType, TypeTag};

/// One decoded argument, borrowing from the packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Argument<'a> {
    Int32(i32),
    Float32(f32),
    Int64(i64),
    Float64(f64),
    String(&'a [u8]),
    Blob(&'a [u8]),
    Bool(bool),
    Nil,
    Impulse,
    ArrayStart,
    ArrayEnd,
}

impl fmt::Display for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Int32(v) => write!(f, "{v}"),
            Argument::Float32(v) => write!(f, "{v}"),
            Argument::Int64(v) => write!(f, "{v}"),
            Argument::Float64(v) => write!(f, "{v}"),
            Argument::String(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            Argument::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
            Argument::Bool(v) => write!(f, "{v}"),
            Argument::Nil => f.write_str("nil"),
            Argument::Impulse => f.write_str("impulse"),
            Argument::ArrayStart => f.write_str("["),
            Argument::ArrayEnd => f.write_str("]"),
        }
    }
}

/// Cursor over a single OSC message.
///
/// Valid only while the borrowed packet is alive and unmodified; the borrow
/// checker enforces this.
#[derive(Debug, Clone)]
pub struct MessageParser<'a> {
    packet: &'a [u8],
    address: &'a [u8],
    type_string: &'a [u8],
    body_start: usize,
    type_cursor: usize,
    data_cursor: usize,
}

impl<'a> MessageParser<'a> {
    /// Parse the address and type string of `packet`.
    pub fn new(packet: &'a [u8]) -> Result<Self> {
        match packet.first() {
            None => return Err(OscError::malformed("packet is empty")),
            Some(b'/') => {}
            Some(b) => {
                return Err(OscError::malformed(format!(
                    "message must start with '/', found 0x{b:02x}"
                )))
            }
        }

        let address_end = find_nul(packet, 0)
            .ok_or_else(|| OscError::malformed("address is not NUL-terminated"))?;
        let types_start = align4(address_end + 1);

        // Messages without a type string are rejected on purpose.
        if packet.get(types_start) != Some(&b',') {
            return Err(OscError::malformed("message has no type string"));
        }

        let types_end = find_nul(packet, types_start)
            .ok_or_else(|| OscError::malformed("type string is not NUL-terminated"))?;
        let body_start = align4(types_end + 1);
        if body_start > packet.len() {
            return Err(OscError::malformed("type string padding is truncated"));
        }

        Ok(Self {
            packet,
            address: &packet[..address_end],
            type_string: &packet[types_start + 1..types_end],
            body_start,
            type_cursor: 0,
            data_cursor: body_start,
        })
    }

    /// Address bytes, without the terminator.
    pub fn address(&self) -> &'a [u8] {
        self.address
    }

    /// Address as UTF-8.
    pub fn address_str(&self) -> Result<&'a str> {
        std::str::from_utf8(self.address)
            .map_err(|e| OscError::malformed(format!("address is not UTF-8: {e}")))
    }

    /// Tag bytes, without the leading `,` and the terminator.
    pub fn type_string(&self) -> &'a [u8] {
        self.type_string
    }

    pub fn argument_count(&self) -> usize {
        self.type_string.len()
    }

    /// Number of tags not yet consumed.
    pub fn remaining(&self) -> usize {
        self.type_string.len().saturating_sub(self.type_cursor)
    }

    /// The whole message, as borrowed.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.packet
    }

    /// Rewind both cursors to the first argument.
    pub fn reset(&mut self) {
        self.type_cursor = 0;
        self.data_cursor = self.body_start;
    }

    /// Tag under the type cursor, or `RawType::END`.
    pub fn peek_next_raw_type(&self) -> RawType {
        self.type_string
            .get(self.type_cursor)
            .map_or(RawType::END, |&b| RawType(b))
    }

    /// Value family of the next tag; `None` at the end or for unknown tags.
    pub fn peek_next_type(&self) -> Option<ArgKind> {
        self.peek_next_raw_type().tag().map(TypeTag::kind)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.expect(ArgKind::Int32)?;
        let v = self.fixed(4, "int32")?.get_i32();
        self.advance(4);
        Ok(v)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.expect(ArgKind::Int64)?;
        let v = self.fixed(8, "int64")?.get_i64();
        self.advance(8);
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.expect(ArgKind::Float32)?;
        let v = self.fixed(4, "float32")?.get_f32();
        self.advance(4);
        Ok(v)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.expect(ArgKind::Float64)?;
        let v = self.fixed(8, "float64")?.get_f64();
        self.advance(8);
        Ok(v)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let tag = self.expect(ArgKind::Bool)?;
        self.type_cursor += 1;
        Ok(tag == TypeTag::True)
    }

    /// String or symbol bytes, without the terminator.
    pub fn read_string(&mut self) -> Result<&'a [u8]> {
        self.expect(ArgKind::String)?;
        let (s, next) = self.string_at()?;
        self.type_cursor += 1;
        self.data_cursor = next;
        Ok(s)
    }

    /// Like [`read_string`](Self::read_string), validating UTF-8 first.
    pub fn read_str(&mut self) -> Result<&'a str> {
        self.expect(ArgKind::String)?;
        let (s, next) = self.string_at()?;
        let s = std::str::from_utf8(s)
            .map_err(|e| OscError::malformed(format!("string argument is not UTF-8: {e}")))?;
        self.type_cursor += 1;
        self.data_cursor = next;
        Ok(s)
    }

    pub fn read_blob(&mut self) -> Result<&'a [u8]> {
        self.expect(ArgKind::Blob)?;
        let (b, next) = self.blob_at()?;
        self.type_cursor += 1;
        self.data_cursor = next;
        Ok(b)
    }

    pub fn skip_array_tag(&mut self) -> Result<()> {
        self.expect(ArgKind::Array)?;
        self.type_cursor += 1;
        Ok(())
    }

    pub fn skip_impulse(&mut self) -> Result<()> {
        self.expect(ArgKind::Impulse)?;
        self.type_cursor += 1;
        Ok(())
    }

    pub fn skip_nil(&mut self) -> Result<()> {
        self.expect(ArgKind::Nil)?;
        self.type_cursor += 1;
        Ok(())
    }

    /// Decode whatever comes next. `Ok(None)` once the type string is
    /// exhausted; unknown tags are malformed.
    pub fn next_argument(&mut self) -> Result<Option<Argument<'a>>> {
        let raw = self.peek_next_raw_type();
        if raw.is_end() {
            return Ok(None);
        }
        let tag = raw
            .tag()
            .ok_or_else(|| OscError::malformed(format!("unknown type tag {raw}")))?;

        let arg = match tag.kind() {
            ArgKind::Int32 => Argument::Int32(self.read_i32()?),
            ArgKind::Float32 => Argument::Float32(self.read_f32()?),
            ArgKind::Int64 => Argument::Int64(self.read_i64()?),
            ArgKind::Float64 => Argument::Float64(self.read_f64()?),
            ArgKind::String => Argument::String(self.read_string()?),
            ArgKind::Blob => Argument::Blob(self.read_blob()?),
            ArgKind::Bool => Argument::Bool(self.read_bool()?),
            ArgKind::Nil => {
                self.skip_nil()?;
                Argument::Nil
            }
            ArgKind::Impulse => {
                self.skip_impulse()?;
                Argument::Impulse
            }
            ArgKind::Array => {
                self.skip_array_tag()?;
                if tag == TypeTag::ArrayStart {
                    Argument::ArrayStart
                } else {
                    Argument::ArrayEnd
                }
            }
        };
        Ok(Some(arg))
    }

    fn expect(&self, kind: ArgKind) -> Result<TypeTag> {
        let found = self.peek_next_raw_type();
        match found.tag() {
            Some(tag) if tag.kind() == kind => Ok(tag),
            _ => Err(OscError::TypeMismatch {
                expected: kind,
                found,
            }),
        }
    }

    fn fixed(&self, len: usize, what: &str) -> Result<&'a [u8]> {
        slice_at(self.packet, self.data_cursor, len, what)
    }

    fn advance(&mut self, payload_len: usize) {
        self.type_cursor += 1;
        self.data_cursor += payload_len;
    }

    fn string_at(&self) -> Result<(&'a [u8], usize)> {
        let end = find_nul(self.packet, self.data_cursor)
            .ok_or_else(|| OscError::malformed("string argument is not NUL-terminated"))?;
        Ok((&self.packet[self.data_cursor..end], align4(end + 1)))
    }

    fn blob_at(&self) -> Result<(&'a [u8], usize)> {
        let len = self.fixed(4, "blob length")?.get_i32();
        let len = usize::try_from(len)
            .map_err(|_| OscError::malformed(format!("negative blob length {len}")))?;
        let start = self.data_cursor + 4;
        let data = slice_at(self.packet, start, len, "blob")?;
        Ok((data, align4(start + len)))
    }
}
