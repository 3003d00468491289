//! OSC socket handle (receive loop lifecycle + sends).
//!
//! Responsibilities:
//! - Spawn one background task that reads a datagram, dispatches it
//!   synchronously, then reads the next
//! - Cooperative stop: checked between receives, never mid-dispatch
//! - Sends go straight to the transport and never wait on the loop

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use oscline_core::error::{OscError, Result};

use crate::config::SocketSection;
use crate::dispatch::Dispatcher;
use crate::transport::udp::{DatagramTransport, UdpTransport};

/// Pause after a failed receive so a persistent socket error cannot spin.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Default destination for [`OscSocket::send`].
    pub remote: Option<SocketAddr>,
    pub recv_buffer_bytes: usize,
}

impl SocketOptions {
    pub fn from_section(cfg: &SocketSection) -> Result<Self> {
        Ok(Self {
            remote: cfg.remote_addr()?,
            recv_buffer_bytes: cfg.recv_buffer_bytes,
        })
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            remote: None,
            recv_buffer_bytes: 65536,
        }
    }
}

/// Running receive loop plus a send handle. Dropping it also stops the loop.
pub struct OscSocket {
    transport: Arc<dyn DatagramTransport>,
    dispatcher: Arc<Dispatcher>,
    remote: Option<SocketAddr>,
    shutdown: watch::Sender<bool>,
    reader: JoinHandle<()>,
}

impl OscSocket {
    /// Bind UDP on `cfg.listen` and start receiving.
    pub async fn bind(cfg: &SocketSection, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        let transport = UdpTransport::bind(cfg.listen_addr()?).await?;
        let opts = SocketOptions::from_section(cfg)?;
        Ok(Self::start(Arc::new(transport), dispatcher, opts))
    }

    /// Start the receive loop over any transport. Must run inside a tokio
    /// runtime.
    pub fn start(
        transport: Arc<dyn DatagramTransport>,
        dispatcher: Arc<Dispatcher>,
        opts: SocketOptions,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let reader = tokio::spawn(receive_loop(
            Arc::clone(&transport),
            Arc::clone(&dispatcher),
            opts.recv_buffer_bytes,
            shutdown_rx,
        ));

        Self {
            transport,
            dispatcher,
            remote: opts.remote,
            shutdown,
            reader,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn remote(&self) -> Option<SocketAddr> {
        self.remote
    }

    pub fn set_remote(&mut self, remote: Option<SocketAddr>) {
        self.remote = remote;
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Send one packet to `dest`, or to the configured remote.
    pub async fn send(&self, bytes: &[u8], dest: Option<SocketAddr>) -> Result<usize> {
        let dest = dest.or(self.remote).ok_or_else(|| {
            OscError::InvalidConfig("no destination given and no remote configured".into())
        })?;

        self.transport.send_to(bytes, dest).await.map_err(|e| {
            self.dispatcher.metrics().send_errors.inc(&[]);
            tracing::warn!(%dest, len = bytes.len(), error = %e, "send failed");
            e
        })
    }

    /// Ask the loop to stop and wait for it. A dispatch in progress finishes
    /// first.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.reader
            .await
            .map_err(|e| OscError::Io(format!("receive loop join failed: {e}")))
    }
}

async fn receive_loop(
    transport: Arc<dyn DatagramTransport>,
    dispatcher: Arc<Dispatcher>,
    recv_buffer_bytes: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = BytesMut::zeroed(recv_buffer_bytes);
    tracing::info!(local = ?transport.local_addr().ok(), "receive loop started");

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                // Sender dropped counts as stop.
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }

            received = transport.recv_from(&mut buf) => {
                match received {
                    Ok((len, source)) => {
                        // Errors are already logged and counted by the dispatcher.
                        let _ = dispatcher.dispatch_datagram(&buf[..len], source);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "receive failed");
                        tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    }
                }
            }
        }
    }

    tracing::info!("receive loop stopped");
}
