//! HTTP API the backend calls to push notifications out over WhatsApp.
//!
//! `GET /` and `GET /health` are open. `POST /send-message` and
//! `POST /send-otp` require the shared secret in `x-internal-key`.

use crate::dispatch::{DispatchError, Dispatcher};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use courier_core::config::ApiConfig;
use http_body_util::LengthLimitError;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// Maximum accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    dispatcher: Arc<Dispatcher>,
    /// `None` when no secret is configured: every dispatch is then refused.
    internal_key: Option<String>,
}

impl ApiState {
    pub fn new(dispatcher: Arc<Dispatcher>, internal_key: &str) -> Self {
        let internal_key = if internal_key.is_empty() {
            None
        } else {
            Some(internal_key.to_string())
        };
        Self {
            dispatcher,
            internal_key,
        }
    }
}

/// Errors surfaced to HTTP callers. Messages never carry internal detail.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Forbidden")]
    Forbidden,

    #[error("WhatsApp client is not ready")]
    ServiceUnavailable,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Invalid phone number")]
    InvalidPhone,

    #[error("Failed to send message")]
    DispatchFailure,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) | Self::InvalidPhone => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::DispatchFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::NotReady(_) => Self::ServiceUnavailable,
            DispatchError::InvalidPhone(_) => Self::InvalidPhone,
            DispatchError::SendFailed(_) => Self::DispatchFailure,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({"success": false, "message": self.to_string()}));
        (self.status(), body).into_response()
    }
}

/// Constant-time string comparison to prevent timing attacks on the shared secret.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

fn check_auth(headers: &HeaderMap, internal_key: &Option<String>) -> Result<(), ApiError> {
    let Some(key) = internal_key else {
        return Err(ApiError::Forbidden);
    };
    let presented = headers
        .get(INTERNAL_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if constant_time_eq(presented, key) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Auth and readiness gates shared by the dispatch endpoints, in that order.
fn admit(headers: &HeaderMap, state: &ApiState) -> Result<(), ApiError> {
    check_auth(headers, &state.internal_key)?;
    if !state.dispatcher.is_ready() {
        return Err(ApiError::ServiceUnavailable);
    }
    Ok(())
}

/// Buffer at most `MAX_BODY_BYTES` and parse a JSON object.
///
/// Called only after `admit`, so unauthorized callers never get the body read.
async fn read_body(body: Body) -> Result<Value, ApiError> {
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            if e.into_inner().downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge
            } else {
                ApiError::BadRequest("Request body could not be read")
            }
        })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(v @ Value::Object(_)) => Ok(v),
        _ => Err(ApiError::BadRequest("Request body must be a JSON object")),
    }
}

/// Read a string field, accepting JSON numbers too. Blank strings count as missing.
fn field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `GET /` and `GET /health`: liveness plus channel state.
async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "whatsapp": state.dispatcher.state(),
    }))
}

/// `POST /send-message` with `{phone, text}`.
async fn send_message(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Body,
) -> Result<Json<Value>, ApiError> {
    admit(&headers, &state)?;

    let body = read_body(body).await?;
    let (Some(phone), Some(text)) = (field(&body, "phone"), field(&body, "text")) else {
        return Err(ApiError::BadRequest("Phone and text are required"));
    };

    state.dispatcher.send_message(&phone, &text).await?;
    Ok(Json(json!({"success": true})))
}

/// `POST /send-otp` with `{phone, code, type?}`.
async fn send_otp(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Body,
) -> Result<Json<Value>, ApiError> {
    admit(&headers, &state)?;

    let body = read_body(body).await?;
    let (Some(phone), Some(code)) = (field(&body, "phone"), field(&body, "code")) else {
        return Err(ApiError::BadRequest("Phone and code are required"));
    };
    let kind = field(&body, "type");

    state
        .dispatcher
        .send_otp(&phone, &code, kind.as_deref())
        .await?;
    Ok(Json(json!({"success": true})))
}

/// Build the axum router with shared state.
fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/send-message", post(send_message))
        .route("/send-otp", post(send_otp))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves.
pub async fn serve<F>(config: &ApiConfig, state: ApiState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if state.internal_key.is_none() {
        warn!("no internal key configured, dispatch endpoints will refuse every request");
    }

    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
