//! # courier-backend
//!
//! Outbound calls to the backend application: login-code verification with
//! its fallback sequence, and notification opt-out.

pub mod client;
pub mod types;
pub mod verify;

pub use client::{BackendClient, BackendError, CallOutcome, Endpoint, HttpReply, HttpTransport};
pub use verify::{Attempt, Escalation, EscalationState, VerificationResult, Verifier};
