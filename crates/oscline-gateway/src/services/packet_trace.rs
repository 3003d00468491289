use std::net::SocketAddr;

use oscline_core::error::Result;
use oscline_core::Packet;

use crate::dispatch::PacketListener;

/// Trace each datagram's shape at `debug` before it is flattened.
pub struct PacketTrace;

impl PacketListener for PacketTrace {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn on_packet(&self, packet: &Packet<'_>, source: SocketAddr) -> Result<()> {
        let len = packet.as_bytes().len();
        if packet.is_bundle() {
            let bundle = packet.as_bundle()?;
            tracing::debug!(%source, len, timestamp = bundle.timestamp(), "osc bundle");
        } else {
            tracing::debug!(%source, len, "osc message");
        }
        Ok(())
    }
}
