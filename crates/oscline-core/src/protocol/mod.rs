//! OSC wire format: messages, bundles, and the root classifier.
//!
//! Layout rules shared by every module here:
//! - Every field ends on a 4-byte boundary; padding bytes are zero.
//! - Numbers are big-endian.
//! - Parsers never index blindly: each read checks `remaining` first and
//!   reports `MalformedPacket` instead of panicking.

pub mod align;
pub mod bundle;
pub mod bundle_builder;
pub mod message;
pub mod message_builder;
pub mod packet;
pub mod tag;

pub use bundle::BundleParser;
pub use bundle_builder::BundleBuilder;
pub use message::MessageParser;
pub use message_builder::MessageBuilder;
pub use packet::{dispatch, dispatch_bounded, Packet};
pub use tag::{ArgKind, RawType, TypeTag};
