use crate::{
    error::RelayError,
    message::{IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Connection state of a messaging transport.
///
/// Written only by the transport's own lifecycle events; everything else
/// reads it through [`Channel::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Started but not yet connected (pairing may be pending).
    Connecting,
    /// Connected and able to send.
    Ready,
    /// Connection dropped; the transport may reconnect on its own.
    Disconnected,
    /// Session rejected by the network (logged out or unlinked).
    AuthFailed,
}

impl ConnectionState {
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::AuthFailed => "auth_failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messaging Channel trait.
///
/// A transport (WhatsApp, a test double, ...) implements this trait to
/// deliver inbound messages and send outbound ones.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, RelayError>;

    /// Send a message to `message.reply_target`.
    async fn send(&self, message: OutgoingMessage) -> Result<(), RelayError>;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), RelayError>;
}
