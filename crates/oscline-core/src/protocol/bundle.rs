//! Bundle parsing (zero-copy, panic-free).

use bytes::Buf;

use crate::error::{OscError, Result};
use crate::protocol::align::{align4, slice_at, BUNDLE_HEADER_LEN, BUNDLE_ID};
use crate::protocol::packet::Packet;

/// Cursor over the length-framed elements of one bundle.
#[derive(Debug, Clone)]
pub struct BundleParser<'a> {
    packet: &'a [u8],
    timestamp: u64,
    cursor: usize,
}

impl<'a> BundleParser<'a> {
    pub fn new(packet: &'a [u8]) -> Result<Self> {
        if !packet.starts_with(BUNDLE_ID) {
            return Err(OscError::malformed("bundle identifier missing"));
        }
        let timestamp = slice_at(packet, BUNDLE_ID.len(), 8, "bundle timestamp")?.get_u64();

        Ok(Self {
            packet,
            timestamp,
            cursor: BUNDLE_HEADER_LEN,
        })
    }

    /// Opaque 64-bit time tag; never interpreted here.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.packet
    }

    pub fn has_next_member(&self) -> bool {
        self.cursor < self.packet.len()
    }

    /// Slice out the next element and classify it. On error the cursor stays
    /// on the offending element.
    pub fn next_member(&mut self) -> Result<Packet<'a>> {
        let len = slice_at(self.packet, self.cursor, 4, "bundle element length")?.get_u32();
        let len = len as usize;
        let body = slice_at(self.packet, self.cursor + 4, len, "bundle element")?;
        let member = Packet::new(body)?;

        self.cursor = align4(self.cursor + 4 + len);
        Ok(member)
    }

    /// Rewind to the first element.
    pub fn reset(&mut self) {
        self.cursor = BUNDLE_HEADER_LEN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(ts: u64, elements: &[&[u8]]) -> Vec<u8> {
        let mut v = BUNDLE_ID.to_vec();
        v.extend_from_slice(&ts.to_be_bytes());
        for e in elements {
            v.extend_from_slice(&(e.len() as u32).to_be_bytes());
            v.extend_from_slice(e);
        }
        v
    }

    #[test]
    fn iterates_and_resets() {
        let bytes = bundle(99, &[b"/a\0\0,\0\0\0", b"/b\0\0,\0\0\0"]);
        let mut b = BundleParser::new(&bytes).unwrap();
        assert_eq!(b.timestamp(), 99);

        let mut addrs = Vec::new();
        while b.has_next_member() {
            addrs.push(b.next_member().unwrap().as_message().unwrap().address());
        }
        assert_eq!(addrs, [b"/a", b"/b"]);

        b.reset();
        assert!(b.has_next_member());
    }

    #[test]
    fn rejects_missing_identifier_and_short_header() {
        assert!(matches!(BundleParser::new(b"#bundlx\0"), Err(OscError::MalformedPacket(_))));
        assert!(matches!(BundleParser::new(b"#bundle\0\0\0"), Err(OscError::MalformedPacket(_))));
    }

    #[test]
    fn element_length_past_end_is_malformed() {
        let mut bytes = bundle(0, &[]);
        bytes.extend_from_slice(&[0, 0, 0, 64]);
        bytes.extend_from_slice(b"/a\0\0,\0\0\0");
        let mut b = BundleParser::new(&bytes).unwrap();
        assert!(matches!(b.next_member(), Err(OscError::MalformedPacket(_))));
        assert!(b.has_next_member());
    }

    #[test]
    fn truncated_length_field_is_malformed() {
        let mut bytes = bundle(0, &[]);
        bytes.extend_from_slice(&[0, 0]);
        let mut b = BundleParser::new(&bytes).unwrap();
        assert!(matches!(b.next_member(), Err(OscError::MalformedPacket(_))));
    }
}
