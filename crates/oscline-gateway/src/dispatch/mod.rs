//! Dispatcher module exports.
//!
//! Re-exports the dispatcher and listener traits so downstream consumers can
//! depend on this module directly.

pub mod dispatcher;

pub use dispatcher::{message_fn, Dispatcher, MessageListener, PacketListener};
