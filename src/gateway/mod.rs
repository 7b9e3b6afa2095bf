//! Inbound message loop: classify, execute, reply once.


use crate::commands::replies::{compose, Outcome};
use crate::commands::Command;
use courier_backend::{CallOutcome, Verifier};
use courier_core::{
    message::{IncomingMessage, OutgoingMessage},
    phone::digits_from_address,
    traits::Channel,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Handles chat commands arriving on a channel.
pub struct Gateway {
    channel: Arc<dyn Channel>,
    verifier: Verifier,
    purchase_url: String,
}

impl Gateway {
    pub fn new(channel: Arc<dyn Channel>, verifier: Verifier, purchase_url: String) -> Self {
        Self {
            channel,
            verifier,
            purchase_url,
        }
    }

    /// Consume inbound messages until the channel closes. One task per message.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<IncomingMessage>) {
        info!("gateway running on {}", self.channel.name());

        while let Some(msg) = rx.recv().await {
            let gw = self.clone();
            tokio::spawn(async move {
                gw.handle_message(msg).await;
            });
        }

        info!("{} receiver closed, gateway stopping", self.channel.name());
    }

    /// Handle one message. Returns the reply text that was sent, if any.
    pub async fn handle_message(&self, msg: IncomingMessage) -> Option<String> {
        let sender_phone = digits_from_address(&msg.sender_id);
        let Some(outcome) = self
            .execute(Command::classify(&msg.text), &sender_phone)
            .await
        else {
            debug!("ignoring message {} from {}", msg.id, msg.sender_id);
            return None;
        };
        let text = compose(&outcome, &self.purchase_url);

        let target = msg
            .reply_target
            .clone()
            .unwrap_or_else(|| msg.sender_id.clone());

        match self
            .channel
            .send(OutgoingMessage::to(target, text.clone()))
            .await
        {
            Ok(()) => Some(text),
            Err(e) => {
                error!("failed to reply to {}: {e}", msg.sender_id);
                None
            }
        }
    }

    async fn execute(&self, command: Command, sender_phone: &str) -> Option<Outcome> {
        let outcome = match command {
            Command::Ignore => return None,
            Command::Buy => Outcome::Buy,
            Command::Stop if sender_phone.is_empty() => {
                warn!("opt-out requested by a sender without a phone number");
                Outcome::StopFailed
            }
            Command::Stop => match self.verifier.client().opt_out(sender_phone).await {
                CallOutcome::Success(()) => {
                    info!("opt-out recorded for {sender_phone}");
                    Outcome::StopConfirmed
                }
                CallOutcome::Rejected { status, message } => {
                    warn!("opt-out rejected for {sender_phone}: HTTP {status} {message:?}");
                    Outcome::StopFailed
                }
                CallOutcome::Unreachable(reason) => {
                    warn!("opt-out failed for {sender_phone}: {reason}");
                    Outcome::StopFailed
                }
            },
            Command::Login(token) => {
                Outcome::Login(self.verifier.verify(&token, sender_phone).await)
            }
        };
        Some(outcome)
    }
}
