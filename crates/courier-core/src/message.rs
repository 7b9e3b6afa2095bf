use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "whatsapp").
    pub channel: String,
    /// Platform-specific sender ID. For WhatsApp this is the sender JID.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific target for routing the reply (e.g. the chat JID).
    #[serde(default)]
    pub reply_target: Option<String>,
}

impl IncomingMessage {
    /// Build a message stamped with a fresh ID and the current time.
    pub fn new(channel: &str, sender_id: &str, text: &str, reply_target: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: None,
            text: text.to_string(),
            timestamp: Utc::now(),
            reply_target,
        }
    }
}

/// An outgoing message to send through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Platform-specific target for routing (e.g. `919123456789@s.whatsapp.net`).
    #[serde(default)]
    pub reply_target: Option<String>,
}

impl OutgoingMessage {
    pub fn to(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_target: Some(target.into()),
        }
    }
}
