//! Outbound notifications requested by the backend: free text and one-time codes.

use courier_core::{
    error::RelayError,
    message::OutgoingMessage,
    phone::{PhoneNormalizer, PhoneNumber},
    traits::{Channel, ConnectionState},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Why a dispatch did not go out.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("whatsapp client is not ready ({0})")]
    NotReady(ConnectionState),

    #[error("invalid phone number")]
    InvalidPhone(#[source] RelayError),

    #[error("failed to send message")]
    SendFailed(#[source] RelayError),
}

/// Sends backend-requested messages through the chat channel.
pub struct Dispatcher {
    channel: Arc<dyn Channel>,
    normalizer: PhoneNormalizer,
    app_name: String,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn Channel>, normalizer: PhoneNormalizer, app_name: String) -> Self {
        Self {
            channel,
            normalizer,
            app_name,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.channel.state()
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Send `text` to `phone`. Returns the normalized number it went to.
    pub async fn send_message(&self, phone: &str, text: &str) -> Result<PhoneNumber, DispatchError> {
        self.deliver(phone, text.to_string()).await
    }

    /// Send a one-time code. `kind == Some("reset")` marks a password reset.
    pub async fn send_otp(
        &self,
        phone: &str,
        code: &str,
        kind: Option<&str>,
    ) -> Result<PhoneNumber, DispatchError> {
        self.deliver(phone, otp_text(&self.app_name, code, kind)).await
    }

    async fn deliver(&self, phone: &str, text: String) -> Result<PhoneNumber, DispatchError> {
        let state = self.state();
        if !state.is_ready() {
            warn!("dispatch refused, channel {state}");
            return Err(DispatchError::NotReady(state));
        }

        let number = self
            .normalizer
            .normalize(phone)
            .map_err(DispatchError::InvalidPhone)?;

        match self
            .channel
            .send(OutgoingMessage::to(number.address(), text))
            .await
        {
            Ok(()) => {
                info!("dispatched message to {number}");
                Ok(number)
            }
            Err(e) => {
                error!("dispatch to {number} failed: {e}");
                Err(DispatchError::SendFailed(e))
            }
        }
    }
}

/// Text of a one-time-code message.
pub fn otp_text(app_name: &str, code: &str, kind: Option<&str>) -> String {
    let label = if kind == Some("reset") {
        "Password Reset "
    } else {
        ""
    };
    format!(
        "🔐 Your {app_name} {label}verification code is: *{code}*\n\n\
         This code expires in 10 minutes. Do not share it with anyone."
    )
}
