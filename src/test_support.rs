//! Test doubles shared by the binary's test modules.

use async_trait::async_trait;
use courier_backend::{BackendClient, BackendError, HttpReply, HttpTransport, Verifier};
use courier_core::{
    error::RelayError,
    message::{IncomingMessage, OutgoingMessage},
    traits::{Channel, ConnectionState},
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A channel that records sent messages instead of delivering them.
pub struct MockChannel {
    pub sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    state: Mutex<ConnectionState>,
    /// When true, `send()` returns an error (simulates delivery failure).
    fail_send: bool,
}

impl MockChannel {
    pub fn ready() -> Arc<Self> {
        Arc::new(Self::with(ConnectionState::Ready, false))
    }

    pub fn in_state(state: ConnectionState) -> Arc<Self> {
        Arc::new(Self::with(state, false))
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::with(ConnectionState::Ready, true))
    }

    fn with(state: ConnectionState, fail_send: bool) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            state: Mutex::new(state),
            fail_send,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, RelayError> {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), RelayError> {
        if self.fail_send {
            return Err(RelayError::Channel("connection reset".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    async fn stop(&self) -> Result<(), RelayError> {
        *self.state.lock().unwrap() = ConnectionState::Disconnected;
        Ok(())
    }
}

/// Replays canned backend replies in order and records request URLs and bodies.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<HttpReply, BackendError>>>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<(u16, Value)>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(status, body)| {
                        Ok(HttpReply {
                            status,
                            body: body.to_string(),
                        })
                    })
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn verifier(self: &Arc<Self>) -> Verifier {
        let client = BackendClient::new(self.clone(), "http://api.test", "http://app.test", "k");
        Verifier::new(client)
    }
}

#[async_trait]
impl HttpTransport for ScriptedBackend {
    async fn post_json(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
        body: Value,
    ) -> Result<HttpReply, BackendError> {
        self.calls.lock().unwrap().push((url.to_string(), body));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Request("connection refused".into())))
    }
}
