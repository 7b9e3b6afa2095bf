//! Login-code verification with a fixed fallback sequence.
//!
//! The sequence is data ([`ESCALATION`]) walked by a small state machine
//! ([`Escalation`]). [`Verifier`] drives it against a [`BackendClient`],
//! one attempt at a time, and stops at the first success.

#[cfg(test)]
mod tests;

use crate::client::{BackendClient, CallOutcome, Endpoint};
use crate::types::VerifiedLogin;
use tracing::{debug, info, warn};

/// One step of the fallback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub endpoint: Endpoint,
    /// Send the sender's phone alongside the hash.
    pub include_phone: bool,
}

/// Phone-scoped attempts first, then the same endpoints without phone.
///
/// Omitting the phone covers numbers the backend stored in a different
/// format than the one the chat transport reports.
pub const ESCALATION: [Attempt; 4] = [
    Attempt {
        endpoint: Endpoint::Primary,
        include_phone: true,
    },
    Attempt {
        endpoint: Endpoint::Secondary,
        include_phone: true,
    },
    Attempt {
        endpoint: Endpoint::Primary,
        include_phone: false,
    },
    Attempt {
        endpoint: Endpoint::Secondary,
        include_phone: false,
    },
];

/// Final outcome of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Success {
        token: String,
        user_phone: Option<String>,
    },
    /// `message` is the last message the backend sent, if any.
    Failure { message: Option<String> },
}

impl VerificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationState {
    Pending,
    /// Waiting on the outcome of the attempt at this index.
    Attempt(usize),
    Succeeded(VerifiedLogin),
    Exhausted,
}

/// State machine over an attempt plan.
#[derive(Debug, Clone)]
pub struct Escalation<'p> {
    plan: &'p [Attempt],
    state: EscalationState,
    /// Message of the most recent rejection. `None` until a rejection arrives.
    last_rejection: Option<Option<String>>,
}

impl<'p> Escalation<'p> {
    pub fn new(plan: &'p [Attempt]) -> Self {
        Self {
            plan,
            state: EscalationState::Pending,
            last_rejection: None,
        }
    }

    pub fn state(&self) -> &EscalationState {
        &self.state
    }

    /// Move from `Pending` to the first attempt. No-op in any other state.
    pub fn start(&mut self) {
        if self.state == EscalationState::Pending {
            self.state = if self.plan.is_empty() {
                EscalationState::Exhausted
            } else {
                EscalationState::Attempt(0)
            };
        }
    }

    /// The attempt awaiting an outcome, if any.
    pub fn current(&self) -> Option<(usize, Attempt)> {
        match self.state {
            EscalationState::Attempt(k) => Some((k, self.plan[k])),
            _ => None,
        }
    }

    /// Record the outcome of the current attempt and advance.
    pub fn record(&mut self, outcome: CallOutcome<VerifiedLogin>) {
        let EscalationState::Attempt(k) = self.state else {
            return;
        };

        match outcome {
            CallOutcome::Success(login) => {
                self.state = EscalationState::Succeeded(login);
                return;
            }
            CallOutcome::Rejected { message, .. } => self.last_rejection = Some(message),
            CallOutcome::Unreachable(_) => {}
        }

        self.state = if k + 1 < self.plan.len() {
            EscalationState::Attempt(k + 1)
        } else {
            EscalationState::Exhausted
        };
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            EscalationState::Succeeded(_) | EscalationState::Exhausted
        )
    }

    /// Collapse the run into a result. Unfinished runs count as failures.
    pub fn finish(self) -> VerificationResult {
        match self.state {
            EscalationState::Succeeded(login) => VerificationResult::Success {
                token: login.token,
                user_phone: login.user_phone,
            },
            _ => VerificationResult::Failure {
                message: self.last_rejection.flatten(),
            },
        }
    }
}

/// Runs the fallback sequence against the backend.
#[derive(Clone)]
pub struct Verifier {
    client: BackendClient,
    plan: Vec<Attempt>,
}

impl Verifier {
    pub fn new(client: BackendClient) -> Self {
        Self::with_plan(client, ESCALATION.to_vec())
    }

    pub fn with_plan(client: BackendClient, plan: Vec<Attempt>) -> Self {
        Self { client, plan }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Verify `token` for the sender whose phone digits are `sender_phone`.
    ///
    /// Attempts run strictly one after another. Never fails: transport
    /// errors count as non-success and the sequence moves on.
    pub async fn verify(&self, token: &str, sender_phone: &str) -> VerificationResult {
        let mut run = Escalation::new(&self.plan);
        run.start();

        while let Some((k, attempt)) = run.current() {
            // Senders without digits (e.g. LID-addressed) cannot be phone-scoped.
            let phone = (attempt.include_phone && !sender_phone.is_empty()).then_some(sender_phone);
            let outcome = self
                .client
                .verify_hash(attempt.endpoint, token, phone)
                .await;

            match &outcome {
                CallOutcome::Success(_) => info!(
                    "login verified on attempt {}/{} ({}, phone={})",
                    k + 1,
                    self.plan.len(),
                    attempt.endpoint.label(),
                    phone.is_some()
                ),
                CallOutcome::Rejected { status, .. } => debug!(
                    "verify attempt {}/{} ({}, phone={}) rejected: HTTP {status}",
                    k + 1,
                    self.plan.len(),
                    attempt.endpoint.label(),
                    phone.is_some()
                ),
                CallOutcome::Unreachable(reason) => warn!(
                    "verify attempt {}/{} ({}) unreachable: {reason}",
                    k + 1,
                    self.plan.len(),
                    attempt.endpoint.label()
                ),
            }

            run.record(outcome);
        }

        run.finish()
    }
}
