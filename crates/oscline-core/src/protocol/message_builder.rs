//! Message encoding into a caller-provided buffer.
//!
//! The header (address + type string) is written up front with one
//! placeholder byte per declared argument. Each `write_*` call fills the next
//! placeholder and appends the payload, so the type string is documented
//! retroactively while payloads stream out. Capacity and argument count are
//! checked before any byte is touched.

use bytes::BufMut;

use crate::error::{OscError, Result};
use crate::protocol::align::{align4, checked_align4};
use crate::protocol::tag::TypeTag;

/// Placeholder for tag slots not yet written. Not a valid tag.
pub(crate) const UNFILLED: u8 = b'!';

/// Written length and completeness of an element being built inside a bundle.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Progress {
    pub(crate) written: usize,
    pub(crate) complete: bool,
}

/// Sequential writer for one OSC message.
#[derive(Debug)]
pub struct MessageBuilder<'a> {
    buf: &'a mut [u8],
    declared: usize,
    next_tag: usize,
    tags_end: usize,
    offset: usize,
    report: Option<&'a mut Progress>,
}

impl<'a> MessageBuilder<'a> {
    /// Write the header for `address` with `argument_count` open tag slots.
    pub fn new(buf: &'a mut [u8], address: &str, argument_count: usize) -> Result<Self> {
        Self::build(buf, address, argument_count, None)
    }

    pub(crate) fn framed(
        buf: &'a mut [u8],
        address: &str,
        argument_count: usize,
        report: &'a mut Progress,
    ) -> Result<Self> {
        Self::build(buf, address, argument_count, Some(report))
    }

    fn build(
        buf: &'a mut [u8],
        address: &str,
        argument_count: usize,
        report: Option<&'a mut Progress>,
    ) -> Result<Self> {
        if !address.starts_with('/') {
            return Err(OscError::misuse(format!(
                "address must start with '/': {address:?}"
            )));
        }
        if address.as_bytes().contains(&0) {
            return Err(OscError::misuse("address contains a NUL byte"));
        }

        let address_len = align4(address.len() + 1);
        // ',' + one slot per argument + NUL
        let (types_len, header_len) = argument_count
            .checked_add(2)
            .and_then(checked_align4)
            .and_then(|types_len| Some((types_len, address_len.checked_add(types_len)?)))
            .ok_or_else(|| {
                OscError::misuse(format!("{argument_count} arguments do not fit a type string"))
            })?;
        if header_len > buf.len() {
            return Err(OscError::BufferTooSmall {
                needed: header_len,
                available: buf.len(),
            });
        }

        let mut w = &mut buf[..header_len];
        w.put_slice(address.as_bytes());
        w.put_bytes(0, address_len - address.len());
        w.put_u8(b',');
        w.put_bytes(UNFILLED, argument_count);
        w.put_bytes(0, types_len - argument_count - 1);

        let next_tag = address_len + 1;
        let mut builder = Self {
            buf,
            declared: argument_count,
            next_tag,
            tags_end: next_tag + argument_count,
            offset: header_len,
            report,
        };
        builder.sync_report();
        Ok(builder)
    }

    /// One-argument convenience packet.
    pub fn simple_f32(buf: &'a mut [u8], address: &str, value: f32) -> Result<&'a [u8]> {
        let mut b = Self::new(buf, address, 1)?;
        b.write_f32(value)?;
        b.packet()
    }

    pub fn simple_i32(buf: &'a mut [u8], address: &str, value: i32) -> Result<&'a [u8]> {
        let mut b = Self::new(buf, address, 1)?;
        b.write_i32(value)?;
        b.packet()
    }

    pub fn simple_bool(buf: &'a mut [u8], address: &str, value: bool) -> Result<&'a [u8]> {
        let mut b = Self::new(buf, address, 1)?;
        b.write_bool(value)?;
        b.packet()
    }

    /// Bytes written so far, padding included.
    pub fn len(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }

    /// Number of declared arguments still to be written.
    pub fn pending(&self) -> usize {
        self.tags_end - self.next_tag
    }

    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.reserve(TypeTag::Int, 4)?.put_i32(v);
        Ok(())
    }

    pub fn write_char(&mut self, c: char) -> Result<()> {
        self.reserve(TypeTag::Char, 4)?.put_u32(u32::from(c));
        Ok(())
    }

    /// RGBA packed as one big-endian word.
    pub fn write_color(&mut self, rgba: u32) -> Result<()> {
        self.reserve(TypeTag::Color, 4)?.put_u32(rgba);
        Ok(())
    }

    /// Port id, status, data1, data2.
    pub fn write_midi(&mut self, msg: [u8; 4]) -> Result<()> {
        self.reserve(TypeTag::Midi, 4)?.put_slice(&msg);
        Ok(())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.reserve(TypeTag::Float, 4)?.put_f32(v);
        Ok(())
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.reserve(TypeTag::Long, 8)?.put_i64(v);
        Ok(())
    }

    pub fn write_timestamp(&mut self, v: u64) -> Result<()> {
        self.reserve(TypeTag::Timestamp, 8)?.put_u64(v);
        Ok(())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.reserve(TypeTag::Double, 8)?.put_f64(v);
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_terminated(TypeTag::String, s.as_bytes())
    }

    pub fn write_symbol(&mut self, s: &str) -> Result<()> {
        self.write_terminated(TypeTag::Symbol, s.as_bytes())
    }

    pub fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        let len = i32::try_from(data.len())
            .map_err(|_| OscError::misuse(format!("blob of {} bytes is too long", data.len())))?;
        let mut w = self.reserve(TypeTag::Blob, 4 + align4(data.len()))?;
        w.put_i32(len);
        w.put_slice(data);
        w.fill(0);
        Ok(())
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        let tag = if v { TypeTag::True } else { TypeTag::False };
        self.reserve(tag, 0).map(drop)
    }

    pub fn write_nil(&mut self) -> Result<()> {
        self.reserve(TypeTag::Nil, 0).map(drop)
    }

    pub fn write_impulse(&mut self) -> Result<()> {
        self.reserve(TypeTag::Impulse, 0).map(drop)
    }

    /// Array markers count as declared arguments.
    pub fn array_start(&mut self) -> Result<()> {
        self.reserve(TypeTag::ArrayStart, 0).map(drop)
    }

    pub fn array_end(&mut self) -> Result<()> {
        self.reserve(TypeTag::ArrayEnd, 0).map(drop)
    }

    /// Finish the message. Fails while any declared argument is unwritten.
    pub fn packet(self) -> Result<&'a [u8]> {
        if !self.is_complete() {
            return Err(OscError::misuse(format!(
                "{} of {} declared arguments written",
                self.declared - self.pending(),
                self.declared
            )));
        }
        let Self { buf, offset, .. } = self;
        let buf: &'a [u8] = buf;
        Ok(&buf[..offset])
    }

    fn write_terminated(&mut self, tag: TypeTag, s: &[u8]) -> Result<()> {
        if s.contains(&0) {
            return Err(OscError::misuse("string argument contains a NUL byte"));
        }
        let mut w = self.reserve(tag, align4(s.len() + 1))?;
        w.put_slice(s);
        w.fill(0);
        Ok(())
    }

    /// Claim the next tag slot and `len` payload bytes.
    fn reserve(&mut self, tag: TypeTag, len: usize) -> Result<&mut [u8]> {
        if self.is_complete() {
            return Err(OscError::misuse(format!(
                "all {} declared arguments already written",
                self.declared
            )));
        }
        let available = self.buf.len() - self.offset;
        if len > available {
            return Err(OscError::BufferTooSmall {
                needed: len,
                available,
            });
        }

        self.buf[self.next_tag] = tag.as_byte();
        self.next_tag += 1;
        let start = self.offset;
        self.offset += len;
        self.sync_report();
        Ok(&mut self.buf[start..self.offset])
    }

    fn sync_report(&mut self) {
        let complete = self.is_complete();
        if let Some(p) = self.report.as_deref_mut() {
            p.written = self.offset;
            p.complete = complete;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::MessageParser;

    #[test]
    fn synth_freq_encoding_is_bit_exact() {
        let mut buf = [0xAAu8; 64];
        let p = MessageBuilder::simple_f32(&mut buf, "/synth/1/freq", 440.0).unwrap();
        assert_eq!(p, b"/synth/1/freq\0\0\0,f\0\0\x43\xdc\0\0");
    }

    #[test]
    fn header_holds_sentinels_until_written() {
        let mut buf = [0u8; 32];
        let mut b = MessageBuilder::new(&mut buf, "/a", 2).unwrap();
        assert_eq!(b.len(), 8);
        assert_eq!(b.pending(), 2);
        b.write_i32(1).unwrap();
        assert!(!b.is_complete());
        drop(b);
        assert_eq!(&buf[4..8], b",i!\0");
    }

    #[test]
    fn packet_before_all_arguments_is_misuse() {
        let mut buf = [0u8; 32];
        let mut b = MessageBuilder::new(&mut buf, "/a", 2).unwrap();
        b.write_i32(1).unwrap();
        let err = b.packet().unwrap_err();
        assert_eq!(err, OscError::BuilderMisuse("1 of 2 declared arguments written".into()));
    }

    #[test]
    fn extra_write_is_rejected_without_touching_buffer() {
        let mut buf = [0xEEu8; 16];
        let mut b = MessageBuilder::new(&mut buf, "/a", 1).unwrap();
        b.write_bool(true).unwrap();
        assert!(matches!(b.write_i32(5), Err(OscError::BuilderMisuse(_))));
        assert_eq!(b.len(), 8);
        drop(b);
        assert_eq!(&buf[8..], &[0xEE; 8]);
    }

    #[test]
    fn short_buffer_is_reported_not_overrun() {
        let mut buf = [0u8; 10];
        let err = MessageBuilder::new(&mut buf, "/abcdef", 0).unwrap_err();
        assert_eq!(err, OscError::BufferTooSmall { needed: 12, available: 10 });

        let mut buf = [0u8; 12];
        let mut b = MessageBuilder::new(&mut buf, "/a", 1).unwrap();
        let err = b.write_str("hello").unwrap_err();
        assert_eq!(err, OscError::BufferTooSmall { needed: 8, available: 4 });
        assert_eq!(b.pending(), 1);
    }

    #[test]
    fn oversized_argument_count_is_rejected() {
        let mut buf = [0u8; 64];
        for n in [usize::MAX, usize::MAX - 1, usize::MAX - 8] {
            assert!(matches!(
                MessageBuilder::new(&mut buf, "/a", n),
                Err(OscError::BuilderMisuse(_))
            ));
        }
        assert!(matches!(
            MessageBuilder::new(&mut buf, "/a", 1 << 20),
            Err(OscError::BufferTooSmall { available: 64, .. })
        ));
        assert_eq!(buf, [0u8; 64]);
    }

    #[test]
    fn rejects_bad_addresses_and_strings() {
        let mut buf = [0u8; 32];
        assert!(matches!(
            MessageBuilder::new(&mut buf, "synth", 0),
            Err(OscError::BuilderMisuse(_))
        ));
        let mut b = MessageBuilder::new(&mut buf, "/a", 1).unwrap();
        assert!(matches!(b.write_str("a\0b"), Err(OscError::BuilderMisuse(_))));
    }

    #[test]
    fn mixed_arguments_parse_back() {
        let mut buf = [0u8; 128];
        let mut b = MessageBuilder::new(&mut buf, "/mix", 7).unwrap();
        b.write_str("abc").unwrap();
        b.write_bool(false).unwrap();
        b.write_blob(&[1, 2, 3, 4, 5]).unwrap();
        b.write_nil().unwrap();
        b.array_start().unwrap();
        b.write_f64(-0.5).unwrap();
        b.array_end().unwrap();
        let p = b.packet().unwrap();
        assert_eq!(p.len() % 4, 0);

        let mut m = MessageParser::new(p).unwrap();
        assert_eq!(m.type_string(), b"sFbN[d]");
        assert_eq!(m.read_str().unwrap(), "abc");
        assert!(!m.read_bool().unwrap());
        assert_eq!(m.read_blob().unwrap(), &[1, 2, 3, 4, 5]);
        m.skip_nil().unwrap();
        m.skip_array_tag().unwrap();
        assert_eq!(m.read_f64().unwrap(), -0.5);
        m.skip_array_tag().unwrap();
        assert_eq!(m.remaining(), 0);
    }

    #[test]
    fn zero_argument_message_is_complete() {
        let mut buf = [0u8; 16];
        let p = MessageBuilder::new(&mut buf, "/ping", 0).unwrap().packet().unwrap();
        assert_eq!(p, b"/ping\0\0\0,\0\0\0");
    }
}
