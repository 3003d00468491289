//! Transport boundary.
//!
//! - `udp`: the datagram seam (`DatagramTransport`) and its tokio UDP impl.
//! - `socket`: `OscSocket`, the explicit handle owning the receive loop.

pub mod socket;
pub mod udp;

pub use socket::{OscSocket, SocketOptions};
pub use udp::{DatagramTransport, UdpTransport};
