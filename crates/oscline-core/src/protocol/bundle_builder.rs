//! Bundle encoding into a caller-provided buffer.
//!
//! Each element gets a 4-byte length slot that is reserved before the child
//! builder starts and patched once the child is finished: either when the
//! next element is requested or when the bundle itself is finalized. At most
//! one child is open at a time and elements are only ever appended.

use bytes::BufMut;

use crate::error::{OscError, Result};
use crate::protocol::align::{BUNDLE_HEADER_LEN, BUNDLE_ID};
use crate::protocol::message_builder::{MessageBuilder, Progress};

/// Sequential writer for one OSC bundle.
///
/// A nested bundle reports its final length to its parent when dropped, so
/// children never need an explicit `packet()` call.
#[derive(Debug)]
pub struct BundleBuilder<'a> {
    buf: &'a mut [u8],
    offset: usize,
    elements: usize,
    open_slot: Option<usize>,
    child: Progress,
    report: Option<&'a mut Progress>,
}

impl<'a> BundleBuilder<'a> {
    /// Write the bundle identifier and `timestamp` (opaque, big-endian).
    pub fn new(buf: &'a mut [u8], timestamp: u64) -> Result<Self> {
        Self::build(buf, timestamp, None)
    }

    fn build(buf: &'a mut [u8], timestamp: u64, report: Option<&'a mut Progress>) -> Result<Self> {
        if buf.len() < BUNDLE_HEADER_LEN {
            return Err(OscError::BufferTooSmall {
                needed: BUNDLE_HEADER_LEN,
                available: buf.len(),
            });
        }

        let mut w = &mut buf[..BUNDLE_HEADER_LEN];
        w.put_slice(BUNDLE_ID);
        w.put_u64(timestamp);

        let mut builder = Self {
            buf,
            offset: BUNDLE_HEADER_LEN,
            elements: 0,
            open_slot: None,
            child: Progress::default(),
            report,
        };
        builder.sync_report(true);
        Ok(builder)
    }

    /// Close the open element (if any) and start a message after a fresh
    /// length slot.
    pub fn next_message_builder(
        &mut self,
        address: &str,
        argument_count: usize,
    ) -> Result<MessageBuilder<'_>> {
        let start = self.open_element()?;
        let Self {
            buf,
            child,
            open_slot,
            ..
        } = self;
        let builder = MessageBuilder::framed(&mut buf[start..], address, argument_count, child)?;
        *open_slot = Some(start - 4);
        Ok(builder)
    }

    /// Close the open element (if any) and start a nested bundle after a
    /// fresh length slot.
    pub fn next_bundle_builder(&mut self, timestamp: u64) -> Result<BundleBuilder<'_>> {
        let start = self.open_element()?;
        let Self {
            buf,
            child,
            open_slot,
            ..
        } = self;
        let builder = BundleBuilder::build(&mut buf[start..], timestamp, Some(child))?;
        *open_slot = Some(start - 4);
        Ok(builder)
    }

    /// Bytes committed so far, including the open element's progress.
    pub fn len(&self) -> usize {
        match self.open_slot {
            Some(slot) => slot + 4 + self.child.written,
            None => self.offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements appended so far, the open one included.
    pub fn element_count(&self) -> usize {
        self.elements + usize::from(self.open_slot.is_some())
    }

    /// Close the open element and return the whole bundle.
    pub fn packet(mut self) -> Result<&'a [u8]> {
        self.seal()?;
        let offset = self.offset;
        let buf = std::mem::take(&mut self.buf);
        let buf: &'a [u8] = buf;
        Ok(&buf[..offset])
    }

    /// Check room for a length slot and return where the element body starts.
    fn open_element(&mut self) -> Result<usize> {
        self.close_open()?;
        let available = self.buf.len() - self.offset;
        if available < 4 {
            return Err(OscError::BufferTooSmall {
                needed: 4,
                available,
            });
        }
        self.child = Progress::default();
        Ok(self.offset + 4)
    }

    fn close_open(&mut self) -> Result<()> {
        let Some(slot) = self.open_slot else {
            return Ok(());
        };
        if !self.child.complete {
            return Err(OscError::misuse(format!(
                "bundle element {} is incomplete",
                self.elements
            )));
        }
        let len = u32::try_from(self.child.written)
            .map_err(|_| OscError::misuse("bundle element exceeds u32 length"))?;
        (&mut self.buf[slot..slot + 4]).put_u32(len);

        self.offset = slot + 4 + self.child.written;
        self.elements += 1;
        self.open_slot = None;
        self.child = Progress::default();
        Ok(())
    }

    fn seal(&mut self) -> Result<()> {
        let res = self.close_open();
        self.sync_report(res.is_ok());
        res
    }

    fn sync_report(&mut self, complete: bool) {
        let written = self.offset;
        if let Some(p) = self.report.as_deref_mut() {
            p.written = written;
            p.complete = complete;
        }
    }
}

impl Drop for BundleBuilder<'_> {
    fn drop(&mut self) {
        if self.report.is_some() {
            let _ = self.seal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::bundle::BundleParser;

    #[test]
    fn empty_bundle_is_header_only() {
        let mut buf = [0u8; 32];
        let p = BundleBuilder::new(&mut buf, 1).unwrap().packet().unwrap();
        assert_eq!(p, b"#bundle\0\0\0\0\0\0\0\0\x01");
    }

    #[test]
    fn length_slots_are_patched_in_order() {
        let mut buf = [0u8; 128];
        let mut b = BundleBuilder::new(&mut buf, 7).unwrap();
        b.next_message_builder("/a", 1).unwrap().write_i32(1).unwrap();
        b.next_message_builder("/bb", 1).unwrap().write_str("xyz").unwrap();
        assert_eq!(b.element_count(), 2);
        let p = b.packet().unwrap();

        assert_eq!(p.len(), 16 + 4 + 12 + 4 + 12);
        assert_eq!(&p[16..20], &[0, 0, 0, 12]);
        assert_eq!(&p[32..36], &[0, 0, 0, 12]);
    }

    #[test]
    fn incomplete_child_blocks_next_element_and_packet() {
        let mut buf = [0u8; 128];
        let mut b = BundleBuilder::new(&mut buf, 0).unwrap();
        b.next_message_builder("/a", 2).unwrap().write_i32(1).unwrap();
        assert!(matches!(
            b.next_message_builder("/b", 0),
            Err(OscError::BuilderMisuse(_))
        ));
        assert!(matches!(b.packet(), Err(OscError::BuilderMisuse(_))));
    }

    #[test]
    fn nested_bundle_reports_length_on_drop() {
        let mut buf = [0u8; 256];
        let mut outer = BundleBuilder::new(&mut buf, 1).unwrap();
        outer.next_message_builder("/first", 0).unwrap();
        {
            let mut inner = outer.next_bundle_builder(2).unwrap();
            inner.next_message_builder("/in", 1).unwrap().write_f32(0.5).unwrap();
        }
        outer.next_message_builder("/last", 0).unwrap();
        let p = outer.packet().unwrap();
        assert_eq!(p.len() % 4, 0);

        let mut bp = BundleParser::new(p).unwrap();
        let first = bp.next_member().unwrap();
        assert!(!first.is_bundle());
        let nested = bp.next_member().unwrap();
        assert_eq!(nested.as_bundle().unwrap().timestamp(), 2);
        assert_eq!(nested.as_bytes().len(), 16 + 4 + 12);
        assert!(bp.has_next_member());
        bp.next_member().unwrap();
        assert!(!bp.has_next_member());
    }

    #[test]
    fn incomplete_grandchild_poisons_parent() {
        let mut buf = [0u8; 256];
        let mut outer = BundleBuilder::new(&mut buf, 1).unwrap();
        {
            let mut inner = outer.next_bundle_builder(2).unwrap();
            inner.next_message_builder("/in", 1).unwrap();
        }
        assert!(matches!(outer.packet(), Err(OscError::BuilderMisuse(_))));
    }

    #[test]
    fn no_room_for_length_slot() {
        let mut buf = [0u8; 18];
        let mut b = BundleBuilder::new(&mut buf, 0).unwrap();
        assert_eq!(
            b.next_message_builder("/a", 0).unwrap_err(),
            OscError::BufferTooSmall { needed: 4, available: 2 }
        );
        assert_eq!(b.packet().unwrap().len(), 16);
    }
}
