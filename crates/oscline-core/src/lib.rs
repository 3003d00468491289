//! oscline core: the OSC 1.0 wire codec.
//!
//! Builders write messages and bundles into caller-owned buffers; parsers are
//! borrowed cursors over received bytes. Nothing here allocates on the hot
//! path, performs I/O, or depends on a runtime, so the codec can be reused by
//! the UDP gateway, tests, and embedded hosts alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every slice access is bounds-checked and malformed input surfaces as
//! `OscError` so a hostile datagram cannot crash the receiver.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, OscError, Result};
pub use protocol::{
    dispatch, dispatch_bounded, ArgKind, BundleBuilder, BundleParser, MessageBuilder,
    MessageParser, Packet, RawType, TypeTag,
};
