use std::net::SocketAddr;

use oscline_core::error::Result;
use oscline_core::MessageParser;

use crate::dispatch::MessageListener;

/// Log every leaf message with its decoded arguments at `info`.
pub struct LogListener;

impl LogListener {
    pub fn new() -> Self {
        Self
    }

    /// `address ,types arg arg ...` rendering used in the log line.
    pub fn render(mut message: MessageParser<'_>) -> Result<String> {
        let mut line = format!(
            "{} ,{}",
            String::from_utf8_lossy(message.address()),
            String::from_utf8_lossy(message.type_string())
        );
        while let Some(arg) = message.next_argument()? {
            line.push(' ');
            line.push_str(&arg.to_string());
        }
        Ok(line)
    }
}

impl Default for LogListener {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListener for LogListener {
    fn name(&self) -> &'static str {
        "log"
    }

    fn on_message(&self, message: MessageParser<'_>, source: SocketAddr) -> Result<()> {
        let line = Self::render(message)?;
        tracing::info!(%source, message = %line, "osc message");
        Ok(())
    }
}
