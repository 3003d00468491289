//! Datagram transport seam.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use oscline_core::error::Result;

/// One datagram per call in each direction.
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    async fn send_to(&self, bytes: &[u8], dest: SocketAddr) -> Result<usize>;

    /// Receive exactly one datagram into `buf`, returning its length and
    /// sender. Oversized datagrams are truncated by the OS.
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;

    fn local_addr(&self) -> Result<SocketAddr>;
}

/// `tokio::net::UdpSocket` transport.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send_to(&self, bytes: &[u8], dest: SocketAddr) -> Result<usize> {
        Ok(self.socket.send_to(bytes, dest).await?)
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(self.socket.recv_from(buf).await?)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}
