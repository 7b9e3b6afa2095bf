use super::*;
use crate::client::{BackendError, HttpReply, HttpTransport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

/// Replays canned replies in order and records every request.
struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpReply, BackendError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Result<HttpReply, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
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
            .unwrap_or_else(|| Err(BackendError::Request("script exhausted".into())))
    }
}

fn reply(status: u16, body: Value) -> Result<HttpReply, BackendError> {
    Ok(HttpReply {
        status,
        body: body.to_string(),
    })
}

fn rejected(message: &str) -> Result<HttpReply, BackendError> {
    reply(400, json!({"success": false, "message": message}))
}

fn accepted(phone: &str) -> Result<HttpReply, BackendError> {
    reply(
        200,
        json!({"success": true, "data": {"token": "jwt", "user": {"phone": phone}}}),
    )
}

fn network_error() -> Result<HttpReply, BackendError> {
    Err(BackendError::Request("connection reset".into()))
}

fn verifier(transport: Arc<ScriptedTransport>) -> Verifier {
    let client = BackendClient::new(transport, "http://api.test", "http://app.test", "k");
    Verifier::new(client)
}

const PRIMARY: &str = "http://api.test/auth/verify-hash-code";
const SECONDARY: &str = "http://app.test/api/auth/verify-hash-code";

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[test]
fn test_escalation_starts_pending() {
    let run = Escalation::new(&ESCALATION);
    assert_eq!(run.state(), &EscalationState::Pending);
    assert!(run.current().is_none());
    assert!(!run.is_finished());
}

#[test]
fn test_escalation_walks_plan_in_order() {
    let mut run = Escalation::new(&ESCALATION);
    run.start();

    let mut seen = Vec::new();
    while let Some((k, attempt)) = run.current() {
        seen.push((k, attempt.endpoint, attempt.include_phone));
        run.record(CallOutcome::Unreachable("down".into()));
    }

    assert_eq!(
        seen,
        vec![
            (0, Endpoint::Primary, true),
            (1, Endpoint::Secondary, true),
            (2, Endpoint::Primary, false),
            (3, Endpoint::Secondary, false),
        ]
    );
    assert_eq!(run.state(), &EscalationState::Exhausted);
}

#[test]
fn test_escalation_stops_on_success() {
    let mut run = Escalation::new(&ESCALATION);
    run.start();
    run.record(CallOutcome::Rejected {
        status: 400,
        message: None,
    });
    run.record(CallOutcome::Success(VerifiedLogin {
        token: "t".into(),
        user_phone: None,
    }));

    assert!(run.is_finished());
    assert!(run.current().is_none());
    assert!(run.finish().is_success());
}

#[test]
fn test_record_after_finish_is_ignored() {
    let mut run = Escalation::new(&ESCALATION);
    run.start();
    run.record(CallOutcome::Success(VerifiedLogin {
        token: "t".into(),
        user_phone: None,
    }));
    run.record(CallOutcome::Rejected {
        status: 400,
        message: Some("late".into()),
    });
    assert!(run.finish().is_success());
}

#[test]
fn test_empty_plan_is_exhausted_immediately() {
    let mut run = Escalation::new(&[]);
    run.start();
    assert_eq!(run.state(), &EscalationState::Exhausted);
    assert_eq!(run.finish(), VerificationResult::Failure { message: None });
}

#[test]
fn test_failure_keeps_last_rejection_message() {
    let mut run = Escalation::new(&ESCALATION);
    run.start();
    run.record(CallOutcome::Rejected {
        status: 400,
        message: Some("Phone mismatch".into()),
    });
    run.record(CallOutcome::Unreachable("timeout".into()));
    run.record(CallOutcome::Rejected {
        status: 400,
        message: Some("Code expired".into()),
    });
    run.record(CallOutcome::Unreachable("timeout".into()));

    assert_eq!(
        run.finish(),
        VerificationResult::Failure {
            message: Some("Code expired".into())
        }
    );
}

#[test]
fn test_later_rejection_without_message_wins() {
    let mut run = Escalation::new(&ESCALATION);
    run.start();
    run.record(CallOutcome::Rejected {
        status: 400,
        message: Some("Phone mismatch".into()),
    });
    run.record(CallOutcome::Rejected {
        status: 400,
        message: None,
    });
    run.record(CallOutcome::Unreachable("timeout".into()));
    run.record(CallOutcome::Unreachable("timeout".into()));

    assert_eq!(run.finish(), VerificationResult::Failure { message: None });
}

// ---------------------------------------------------------------------------
// Verifier against a scripted backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_first_attempt_success_makes_one_call() {
    let transport = ScriptedTransport::new(vec![accepted("919123456789")]);
    let result = verifier(transport.clone())
        .verify("abc123", "919123456789")
        .await;

    assert_eq!(
        result,
        VerificationResult::Success {
            token: "jwt".into(),
            user_phone: Some("919123456789".into()),
        }
    );
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, PRIMARY);
    assert_eq!(
        calls[0].1,
        json!({"hash": "abc123", "phone": "919123456789"})
    );
}

#[tokio::test]
async fn test_second_attempt_success_stops_sequence() {
    let transport = ScriptedTransport::new(vec![rejected("Phone mismatch"), accepted("44")]);
    let result = verifier(transport.clone()).verify("abc123", "919123456789").await;

    assert!(result.is_success());
    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0, SECONDARY);
    assert_eq!(calls[1].1["phone"], "919123456789");
}

#[tokio::test]
async fn test_same_script_gives_same_result() {
    let script = || vec![rejected("Phone mismatch"), accepted("919123456789")];
    let first = verifier(ScriptedTransport::new(script()))
        .verify("abc123", "919123456789")
        .await;
    let second = verifier(ScriptedTransport::new(script()))
        .verify("abc123", "919123456789")
        .await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_phoneless_fallback_reached_after_phone_attempts_fail() {
    let transport = ScriptedTransport::new(vec![
        rejected("Phone mismatch"),
        network_error(),
        accepted("919123456789"),
    ]);
    let result = verifier(transport.clone()).verify("abc123", "919123456789").await;

    assert!(result.is_success());
    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2].0, PRIMARY);
    assert_eq!(calls[2].1, json!({"hash": "abc123"}));
}

#[tokio::test]
async fn test_all_attempts_fail_returns_last_payload() {
    let transport = ScriptedTransport::new(vec![
        rejected("Phone mismatch"),
        rejected("Phone mismatch"),
        rejected("Invalid code"),
        rejected("Code expired"),
    ]);
    let result = verifier(transport.clone()).verify("abc123", "919123456789").await;

    assert_eq!(
        result,
        VerificationResult::Failure {
            message: Some("Code expired".into())
        }
    );
    let urls: Vec<String> = transport.calls().into_iter().map(|(u, _)| u).collect();
    assert_eq!(urls, vec![PRIMARY, SECONDARY, PRIMARY, SECONDARY]);
}

#[tokio::test]
async fn test_all_attempts_throw_returns_generic_failure() {
    let transport = ScriptedTransport::new(vec![
        network_error(),
        network_error(),
        reply(502, json!("not an object")),
        network_error(),
    ]);
    let result = verifier(transport.clone()).verify("abc123", "919123456789").await;

    assert_eq!(result, VerificationResult::Failure { message: None });
    assert_eq!(transport.calls().len(), 4);
}

#[tokio::test]
async fn test_sender_without_digits_never_sends_phone() {
    let transport = ScriptedTransport::new(vec![]);
    let result = verifier(transport.clone()).verify("abc123", "").await;

    assert!(!result.is_success());
    for (_, body) in transport.calls() {
        assert!(body.get("phone").is_none(), "unexpected phone in {body}");
    }
}
