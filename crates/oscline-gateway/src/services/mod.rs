//! Built-in listeners registered by `AppState`.

pub mod log_messages;
pub mod packet_trace;

pub use log_messages::LogListener;
pub use packet_trace::PacketTrace;
