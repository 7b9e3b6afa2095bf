//! Incoming WhatsApp message handling: filter, unwrap and forward.

use courier_core::message::IncomingMessage;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Process an incoming WhatsApp message event.
///
/// Only direct text messages from other users are forwarded. Groups, status
/// broadcasts, our own messages, and media without text are dropped.
pub(super) async fn handle_whatsapp_message(
    msg: waproto::whatsapp::Message,
    info: wacore::types::message::MessageInfo,
    tx: &mpsc::Sender<IncomingMessage>,
) {
    if info.source.is_group {
        debug!("WA filtered: ignoring group message");
        return;
    }
    if info.source.is_from_me {
        return;
    }
    if info.source.chat.user == "status" {
        debug!("WA filtered: ignoring status broadcast");
        return;
    }

    let Some(text) = message_text(&msg) else {
        debug!("WA filtered: no text in message {}", info.id);
        return;
    };

    let mut incoming = IncomingMessage::new(
        "whatsapp",
        &info.source.sender.to_string(),
        &text,
        Some(info.source.chat.to_string()),
    );
    if !info.push_name.is_empty() {
        incoming.sender_name = Some(info.push_name.clone());
    }

    if tx.send(incoming).await.is_err() {
        info!("whatsapp channel receiver dropped");
    }
}

/// Text body of a message, looking through device-sent, ephemeral, and
/// view-once wrappers. `None` when there is no non-blank text.
pub(super) fn message_text(msg: &waproto::whatsapp::Message) -> Option<String> {
    let inner = msg
        .device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(msg);

    inner
        .conversation
        .as_deref()
        .or_else(|| {
            inner
                .extended_text_message
                .as_ref()
                .and_then(|e| e.text.as_deref())
        })
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
}
