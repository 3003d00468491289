use std::net::SocketAddr;

use serde::Deserialize;
use oscline_core::error::{OscError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub socket: SocketSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(OscError::InvalidConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.socket.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocketSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Default destination for `OscSocket::send`.
    #[serde(default)]
    pub remote: Option<String>,

    #[serde(default = "default_recv_buffer_bytes")]
    pub recv_buffer_bytes: usize,

    #[serde(default = "default_max_bundle_depth")]
    pub max_bundle_depth: usize,
}

impl Default for SocketSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            remote: None,
            recv_buffer_bytes: default_recv_buffer_bytes(),
            max_bundle_depth: default_max_bundle_depth(),
        }
    }
}

impl SocketSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.remote_addr()?;
        if !(512..=65536).contains(&self.recv_buffer_bytes) {
            return Err(OscError::InvalidConfig(
                "socket.recv_buffer_bytes must be between 512 and 65536".into(),
            ));
        }
        if !(1..=1024).contains(&self.max_bundle_depth) {
            return Err(OscError::InvalidConfig(
                "socket.max_bundle_depth must be between 1 and 1024".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            OscError::InvalidConfig(format!("socket.listen {:?}: {e}", self.listen))
        })
    }

    pub fn remote_addr(&self) -> Result<Option<SocketAddr>> {
        self.remote
            .as_deref()
            .map(|r| {
                r.parse()
                    .map_err(|e| OscError::InvalidConfig(format!("socket.remote {r:?}: {e}")))
            })
            .transpose()
    }
}

fn default_listen() -> String {
    "0.0.0.0:9000".into()
}
fn default_recv_buffer_bytes() -> usize {
    65536
}
fn default_max_bundle_depth() -> usize {
    32
}
