//! oscline gateway library entry.
//!
//! This crate wires the UDP transport, the listener dispatcher, config, and
//! metrics around the `oscline-core` codec. It is intended to be consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod services;
pub mod transport;
