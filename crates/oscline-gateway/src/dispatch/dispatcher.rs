use std::any::Any;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use oscline_core::error::{ErrorCode, Result};
use oscline_core::protocol::packet::{dispatch_bounded, Packet};
use oscline_core::{MessageParser, OscError};

use crate::obs::GatewayMetrics;

/// Sees every classified datagram once, before flattening.
pub trait PacketListener: Send + Sync {
    fn name(&self) -> &'static str;
    fn on_packet(&self, packet: &Packet<'_>, source: SocketAddr) -> Result<()>;
}

/// Sees every leaf message, bundles flattened depth-first.
///
/// Each call gets its own parser with fresh cursors.
pub trait MessageListener: Send + Sync {
    fn name(&self) -> &'static str;
    fn on_message(&self, message: MessageParser<'_>, source: SocketAddr) -> Result<()>;
}

struct FnMessageListener<F> {
    name: &'static str,
    f: F,
}

impl<F> MessageListener for FnMessageListener<F>
where
    F: Fn(MessageParser<'_>, SocketAddr) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_message(&self, message: MessageParser<'_>, source: SocketAddr) -> Result<()> {
        (self.f)(message, source)
    }
}

/// Wrap a closure as a named message listener.
pub fn message_fn<F>(name: &'static str, f: F) -> Arc<dyn MessageListener>
where
    F: Fn(MessageParser<'_>, SocketAddr) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnMessageListener { name, f })
}

/// Listener registry plus the per-datagram classify/flatten pipeline.
///
/// Registration is safe while the receive loop is running; each dispatch
/// works on a snapshot of the listeners present when it started. Listeners
/// are keyed by name and invoked in no particular order, so they must not
/// depend on one another.
pub struct Dispatcher {
    packet: DashMap<&'static str, Arc<dyn PacketListener>>,
    message: DashMap<&'static str, Arc<dyn MessageListener>>,
    metrics: Arc<GatewayMetrics>,
    max_bundle_depth: usize,
}

impl Dispatcher {
    pub fn new(max_bundle_depth: usize, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            packet: DashMap::new(),
            message: DashMap::new(),
            metrics,
            max_bundle_depth,
        }
    }

    pub fn register_packet(&self, listener: Arc<dyn PacketListener>) {
        self.packet.insert(listener.name(), listener);
    }

    pub fn register_message(&self, listener: Arc<dyn MessageListener>) {
        self.message.insert(listener.name(), listener);
    }

    pub fn unregister_packet(&self, name: &str) -> bool {
        self.packet.remove(name).is_some()
    }

    pub fn unregister_message(&self, name: &str) -> bool {
        self.message.remove(name).is_some()
    }

    pub fn registered_packet_listeners(&self) -> Vec<&'static str> {
        self.packet.iter().map(|e| *e.key()).collect()
    }

    pub fn registered_message_listeners(&self) -> Vec<&'static str> {
        self.message.iter().map(|e| *e.key()).collect()
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    /// Classify one datagram, hand it to packet listeners, then flatten it
    /// into message listeners. Returns the number of leaf messages delivered.
    ///
    /// Listener failures are logged and counted; they never stop siblings or
    /// the caller. A malformed datagram is logged, counted, and returned.
    pub fn dispatch_datagram(&self, bytes: &[u8], source: SocketAddr) -> Result<usize> {
        let started = Instant::now();
        let res = self.dispatch_inner(bytes, source);
        self.metrics.dispatch_duration.observe(&[], started.elapsed());

        match &res {
            Ok(_) => self.metrics.datagrams.inc(&[("outcome", "ok")]),
            Err(e) => {
                let outcome = match e.code() {
                    ErrorCode::NestingTooDeep => "too_deep",
                    _ => "malformed",
                };
                self.metrics.datagrams.inc(&[("outcome", outcome)]);
                tracing::warn!(%source, len = bytes.len(), error = %e, "dropping datagram");
            }
        }
        res
    }

    fn dispatch_inner(&self, bytes: &[u8], source: SocketAddr) -> Result<usize> {
        let packet = Packet::new(bytes)?;

        // Snapshot so listeners may (un)register without deadlocking a shard.
        let packet_listeners: Vec<_> = self.packet.iter().map(|e| e.value().clone()).collect();
        for l in &packet_listeners {
            let res = catch_unwind(AssertUnwindSafe(|| l.on_packet(&packet, source)));
            if let Err(e) = contain(l.name(), res) {
                self.listener_failed(l.name(), "packet", source, &e);
            }
        }

        let message_listeners: Vec<_> = self.message.iter().map(|e| e.value().clone()).collect();
        if message_listeners.is_empty() {
            return Ok(0);
        }

        let mut delivered = 0;
        dispatch_bounded(packet, self.max_bundle_depth, |msg| {
            delivered += 1;
            self.metrics.messages.inc(&[]);
            for l in &message_listeners {
                let res = catch_unwind(AssertUnwindSafe(|| l.on_message(msg.clone(), source)));
                if let Err(e) = contain(l.name(), res) {
                    self.listener_failed(l.name(), "message", source, &e);
                }
            }
        })?;
        Ok(delivered)
    }

    fn listener_failed(&self, name: &'static str, kind: &str, source: SocketAddr, e: &OscError) {
        self.metrics
            .listener_errors
            .inc(&[("listener", name), ("kind", kind)]);
        tracing::warn!(listener = name, kind, %source, error = %e, "listener failed");
    }
}

/// Turn a listener panic into a `Listener` error.
fn contain(name: &'static str, res: std::thread::Result<Result<()>>) -> Result<()> {
    res.unwrap_or_else(|payload| {
        Err(OscError::Listener {
            name,
            msg: format!("panicked: {}", panic_message(payload.as_ref())),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
