//! WhatsApp channel, pure Rust implementation via `whatsapp-rust`.
//!
//! Uses the WhatsApp Web protocol (Noise handshake + Signal encryption).
//! Pairing is done by scanning a QR code, like WhatsApp Web.
//! Session is persisted to `{data_dir}/whatsapp_session/whatsapp.db`.

mod bot;
mod channel;
mod events;
mod qr;


pub use qr::generate_qr_terminal;

use courier_core::config::WhatsAppConfig;
use courier_core::error::RelayError;
use courier_core::traits::ConnectionState;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::info;

/// WhatsApp channel using the WhatsApp Web protocol.
pub struct WhatsAppChannel {
    pub(super) config: WhatsAppConfig,
    pub(super) data_dir: String,
    /// Client handle for sending messages; set once the bot is built.
    pub(super) client: Arc<Mutex<Option<Arc<whatsapp_rust::client::Client>>>>,
    /// Written only by bot lifecycle events.
    pub(super) state_tx: Arc<watch::Sender<ConnectionState>>,
    pub(super) state_rx: watch::Receiver<ConnectionState>,
}

impl WhatsAppChannel {
    /// Create a new WhatsApp channel from config.
    pub fn new(config: WhatsAppConfig, data_dir: &str) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        Self {
            config,
            data_dir: data_dir.to_string(),
            client: Arc::new(Mutex::new(None)),
            state_tx: Arc::new(state_tx),
            state_rx,
        }
    }

    /// Watch connection-state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Session database path. Creates the session directory if missing.
    pub(super) fn session_db_path(&self) -> Result<String, RelayError> {
        let dir = courier_core::config::shellexpand(&self.data_dir);
        let session_dir = format!("{dir}/whatsapp_session");
        std::fs::create_dir_all(&session_dir)?;
        Ok(format!("{session_dir}/whatsapp.db"))
    }
}

/// Publish a lifecycle transition.
pub(super) fn set_state(tx: &watch::Sender<ConnectionState>, next: ConnectionState) {
    let prev = tx.send_replace(next);
    if prev != next {
        info!("whatsapp state: {prev} -> {next}");
    }
}
