//! Channel trait implementation for WhatsApp.

use super::{set_state, WhatsAppChannel};
use async_trait::async_trait;
use courier_core::{
    error::RelayError,
    message::{IncomingMessage, OutgoingMessage},
    traits::{Channel, ConnectionState},
};
use tokio::sync::mpsc;
use tracing::info;
use wacore_binary::jid::Jid;

impl WhatsAppChannel {
    /// Send a text message to a JID string (phone@s.whatsapp.net).
    ///
    /// One attempt only; callers decide what a failure means.
    async fn send_text(&self, jid_str: &str, text: &str) -> Result<(), RelayError> {
        let client = self
            .client
            .lock()
            .await
            .clone()
            .ok_or_else(|| RelayError::Channel("whatsapp client not connected".into()))?;

        let jid: Jid = jid_str
            .parse()
            .map_err(|e| RelayError::Channel(format!("invalid whatsapp JID '{jid_str}': {e}")))?;

        let msg = waproto::whatsapp::Message {
            conversation: Some(text.to_string()),
            ..Default::default()
        };
        client
            .send_message(jid, msg)
            .await
            .map_err(|e| RelayError::Channel(format!("whatsapp send failed: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, RelayError> {
        let (tx, rx) = mpsc::channel(64);
        if !self.config.enabled {
            // Dropping `tx` closes the receiver; dispatch sees Disconnected.
            set_state(&self.state_tx, ConnectionState::Disconnected);
            info!("WhatsApp channel disabled, not connecting");
            return Ok(rx);
        }
        self.build_and_run_bot(tx).await?;
        info!("WhatsApp channel started");
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), RelayError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| RelayError::Channel("no reply_target on outgoing message".into()))?;

        self.send_text(target, &message.text).await
    }

    fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    async fn stop(&self) -> Result<(), RelayError> {
        *self.client.lock().await = None;
        set_state(&self.state_tx, ConnectionState::Disconnected);
        info!("WhatsApp channel stopped");
        Ok(())
    }
}
