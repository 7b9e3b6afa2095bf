//! Backend gateway client.
//!
//! JSON POSTs to the backend's bot endpoints over any [`HttpTransport`].
//! Calls never return `Err`: every result, including transport and parse
//! failures, comes back as a [`CallOutcome`].


use crate::types::{
    OptOutRequest, OptOutResponse, VerifiedLogin, VerifyRequest, VerifyResponse,
};
use async_trait::async_trait;
use courier_core::config::BackendConfig;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Header carrying the shared secret on internal calls.
pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// Raw HTTP transport failure.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("failed to build http client: {0}")]
    Build(String),
}

/// Status and raw body of an HTTP response.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Anything that can POST a JSON body and hand back the response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: serde_json::Value,
    ) -> Result<HttpReply, BackendError>;
}

/// `reqwest`-backed transport with a fixed per-request timeout.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: serde_json::Value,
    ) -> Result<HttpReply, BackendError> {
        let mut req = self.client.post(url).json(&body);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(e.to_string())
            } else {
                BackendError::Request(e.to_string())
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::Request(format!("failed to read body: {e}")))?;
        Ok(HttpReply { status, body })
    }
}

/// Result of one boundary-crossing backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    /// HTTP 2xx and `success: true`.
    Success(T),
    /// The backend answered but did not report success.
    Rejected { status: u16, message: Option<String> },
    /// No usable answer: network error, timeout, or unparsable body.
    Unreachable(String),
}

impl<T> CallOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Which verify endpoint an attempt targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Backend API (`{api_base}/auth/verify-hash-code`).
    Primary,
    /// Application server (`{app_base}/api/auth/verify-hash-code`).
    Secondary,
}

impl Endpoint {
    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Client for the backend's bot endpoints.
#[derive(Clone)]
pub struct BackendClient {
    http: Arc<dyn HttpTransport>,
    api_base: String,
    app_base: String,
    internal_key: String,
}

impl BackendClient {
    pub fn new(
        http: Arc<dyn HttpTransport>,
        api_base: impl Into<String>,
        app_base: impl Into<String>,
        internal_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            app_base: app_base.into().trim_end_matches('/').to_string(),
            internal_key: internal_key.into(),
        }
    }

    /// Build a client with a `reqwest` transport from config.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = ReqwestTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(
            Arc::new(http),
            config.api_base(),
            config.app_base(),
            config.internal_key.clone(),
        ))
    }

    pub fn verify_url(&self, endpoint: Endpoint) -> String {
        match endpoint {
            Endpoint::Primary => format!("{}/auth/verify-hash-code", self.api_base),
            Endpoint::Secondary => format!("{}/api/auth/verify-hash-code", self.app_base),
        }
    }

    pub fn opt_out_url(&self) -> String {
        format!("{}/bot/whatsapp-optout", self.api_base)
    }

    /// Ask `endpoint` to verify a login hash, optionally scoped to `phone`.
    pub async fn verify_hash(
        &self,
        endpoint: Endpoint,
        hash: &str,
        phone: Option<&str>,
    ) -> CallOutcome<VerifiedLogin> {
        let url = self.verify_url(endpoint);
        let body = match serde_json::to_value(VerifyRequest { hash, phone }) {
            Ok(b) => b,
            Err(e) => return CallOutcome::Unreachable(format!("encode failed: {e}")),
        };

        match self.post::<VerifyResponse>(&url, body).await {
            Ok((status, parsed)) if (200..300).contains(&status) && parsed.success => {
                let login = parsed
                    .data
                    .map(VerifiedLogin::from)
                    .unwrap_or(VerifiedLogin {
                        token: String::new(),
                        user_phone: None,
                    });
                CallOutcome::Success(login)
            }
            Ok((status, parsed)) => CallOutcome::Rejected {
                status,
                message: parsed.message,
            },
            Err(reason) => CallOutcome::Unreachable(reason),
        }
    }

    /// Opt `phone` out of WhatsApp notifications.
    pub async fn opt_out(&self, phone: &str) -> CallOutcome<()> {
        let url = self.opt_out_url();
        let body = match serde_json::to_value(OptOutRequest { phone }) {
            Ok(b) => b,
            Err(e) => return CallOutcome::Unreachable(format!("encode failed: {e}")),
        };

        match self.post::<OptOutResponse>(&url, body).await {
            Ok((status, parsed)) if (200..300).contains(&status) && parsed.success => {
                CallOutcome::Success(())
            }
            Ok((status, parsed)) => CallOutcome::Rejected {
                status,
                message: parsed.message,
            },
            Err(reason) => CallOutcome::Unreachable(reason),
        }
    }

    async fn post<R: DeserializeOwned>(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<(u16, R), String> {
        debug!("backend: POST {url}");
        let headers: Vec<(&str, &str)> = if self.internal_key.is_empty() {
            Vec::new()
        } else {
            vec![(INTERNAL_KEY_HEADER, self.internal_key.as_str())]
        };

        let reply = self
            .http
            .post_json(url, &headers, body)
            .await
            .map_err(|e| e.to_string())?;

        let parsed = serde_json::from_str::<R>(&reply.body)
            .map_err(|e| format!("unparsable response (HTTP {}): {e}", reply.status))?;
        Ok((reply.status, parsed))
    }
}
