//! Lightweight in-process metrics.
//!
//! Counters and histograms are stored as atomics keyed by label sets and
//! rendered in Prometheus text format on demand. The receive loop records
//! every datagram outcome here so malformed traffic and failing listeners
//! stay visible without interrupting the loop.

pub mod metrics;

pub use metrics::GatewayMetrics;
