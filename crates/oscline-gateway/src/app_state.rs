//! Shared application state for the oscline gateway.
//!
//! Builds the dispatcher from config, registers the built-in listeners, and
//! owns the metrics registry. Startup errors are returned, not panicked.

use std::sync::Arc;

use oscline_core::error::Result;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::obs::GatewayMetrics;
use crate::services::{LogListener, PacketTrace};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<GatewayConfig>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(GatewayMetrics::default());
        let dispatcher = Dispatcher::new(cfg.socket.max_bundle_depth, Arc::clone(&metrics));

        dispatcher.register_packet(Arc::new(PacketTrace));
        dispatcher.register_message(Arc::new(LogListener::new()));

        tracing::debug!(
            packet = ?dispatcher.registered_packet_listeners(),
            message = ?dispatcher.registered_message_listeners(),
            "built-in listeners registered"
        );

        Ok(Self {
            cfg: Arc::new(cfg),
            dispatcher: Arc::new(dispatcher),
            metrics,
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }
}
