//! Root classifier and recursive bundle flattening.

use crate::error::{OscError, Result};
use crate::protocol::bundle::BundleParser;
use crate::protocol::message::MessageParser;

/// What the first byte says a packet is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Message,
    Bundle,
}

/// A classified, borrowed OSC packet.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    bytes: &'a [u8],
    kind: PacketKind,
}

impl<'a> Packet<'a> {
    /// Classify by the first byte. The full bundle identifier is only
    /// checked by [`as_bundle`](Self::as_bundle).
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        let kind = match bytes.first() {
            None => return Err(OscError::malformed("packet is empty")),
            Some(b'/') => PacketKind::Message,
            Some(b'#') => PacketKind::Bundle,
            Some(b) => {
                return Err(OscError::malformed(format!(
                    "unknown classifier byte 0x{b:02x}"
                )))
            }
        };
        Ok(Self { bytes, kind })
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn is_bundle(&self) -> bool {
        self.kind == PacketKind::Bundle
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn as_message(&self) -> Result<MessageParser<'a>> {
        MessageParser::new(self.bytes)
    }

    pub fn as_bundle(&self) -> Result<BundleParser<'a>> {
        BundleParser::new(self.bytes)
    }
}

/// Invoke `on_message` for every leaf message, depth-first in element order.
///
/// Nesting depth is unbounded; use [`dispatch_bounded`] for untrusted input.
/// Messages before a malformed element have already been delivered when the
/// error is returned.
pub fn dispatch<'a, F>(packet: Packet<'a>, mut on_message: F) -> Result<()>
where
    F: FnMut(MessageParser<'a>),
{
    walk(packet, &mut on_message, 0, None)
}

/// Like [`dispatch`], failing with `NestingTooDeep` once bundles nest more
/// than `max_depth` levels.
pub fn dispatch_bounded<'a, F>(packet: Packet<'a>, max_depth: usize, mut on_message: F) -> Result<()>
where
    F: FnMut(MessageParser<'a>),
{
    walk(packet, &mut on_message, 0, Some(max_depth))
}

fn walk<'a, F>(packet: Packet<'a>, on_message: &mut F, depth: usize, limit: Option<usize>) -> Result<()>
where
    F: FnMut(MessageParser<'a>),
{
    match packet.kind {
        PacketKind::Message => {
            on_message(packet.as_message()?);
        }
        PacketKind::Bundle => {
            if let Some(limit) = limit {
                if depth >= limit {
                    return Err(OscError::NestingTooDeep { limit });
                }
            }
            let mut bundle = packet.as_bundle()?;
            tracing::trace!(depth, timestamp = bundle.timestamp(), "flattening bundle");
            while bundle.has_next_member() {
                let member = bundle.next_member()?;
                walk(member, on_message, depth + 1, limit)?;
            }
        }
    }
    Ok(())
}
