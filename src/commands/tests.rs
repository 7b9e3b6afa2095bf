use super::replies::{compose, Outcome, DEFAULT_LOGIN_FAILURE, STOP_CONFIRMED, STOP_FAILED};
use super::*;
use courier_backend::VerificationResult;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn test_classify_buy_variants() {
    for text in ["buy", "BUY", "/buy", "buy plan", "Buy Plan", "  buy  "] {
        assert_eq!(Command::classify(text), Command::Buy, "text: {text:?}");
    }
}

#[test]
fn test_classify_stop_variants() {
    for text in ["stop", "Stop", "/STOP", "unsubscribe", " Unsubscribe\n"] {
        assert_eq!(Command::classify(text), Command::Stop, "text: {text:?}");
    }
}

#[test]
fn test_buy_must_match_whole_body() {
    assert_eq!(Command::classify("buy now please"), Command::Ignore);
    assert_eq!(Command::classify("please stop"), Command::Ignore);
}

#[test]
fn test_classify_login_command() {
    assert_eq!(
        Command::classify("/login abc123"),
        Command::Login("abc123".to_string())
    );
    assert_eq!(
        Command::classify("/LOGIN   xY9 extra words"),
        Command::Login("xY9".to_string())
    );
}

#[test]
fn test_login_command_keeps_code_case() {
    assert_eq!(
        Command::classify("/Login AbC123"),
        Command::Login("AbC123".to_string())
    );
}

#[test]
fn test_login_without_code_is_ignored() {
    assert_eq!(Command::classify("/login"), Command::Ignore);
    assert_eq!(Command::classify("/login   "), Command::Ignore);
}

#[test]
fn test_classify_bare_code() {
    assert_eq!(
        Command::classify("abc123"),
        Command::Login("abc123".to_string())
    );
    assert_eq!(
        Command::classify("  K7Q2ZP9X \n"),
        Command::Login("K7Q2ZP9X".to_string())
    );
}

#[test]
fn test_bare_code_rules() {
    assert_eq!(Command::classify("abc12"), Command::Ignore);
    assert_eq!(Command::classify("abc 123"), Command::Ignore);
    assert_eq!(Command::classify("abc-123"), Command::Ignore);
    assert_eq!(Command::classify("héllo12"), Command::Ignore);
}

#[test]
fn test_classify_ignore() {
    assert_eq!(Command::classify("hi"), Command::Ignore);
    assert_eq!(Command::classify(""), Command::Ignore);
    assert_eq!(Command::classify("hello there"), Command::Ignore);
}

#[test]
fn test_keyword_match_is_exact() {
    assert_eq!(Command::classify("BUYBUY"), Command::Login("BUYBUY".into()));
    assert_eq!(Command::classify("unsubscribe"), Command::Stop);
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

fn login_ok(phone: Option<&str>) -> Outcome {
    Outcome::Login(VerificationResult::Success {
        token: "secret-session-token".into(),
        user_phone: phone.map(str::to_string),
    })
}

#[test]
fn test_buy_reply_has_purchase_link() {
    let text = compose(&Outcome::Buy, "https://app.example.com/pricing");
    assert!(text.contains("https://app.example.com/pricing"));
}

#[test]
fn test_stop_replies() {
    assert_eq!(compose(&Outcome::StopConfirmed, ""), STOP_CONFIRMED);
    assert_eq!(compose(&Outcome::StopFailed, ""), STOP_FAILED);
    assert!(STOP_FAILED.contains("try again later"));
}

#[test]
fn test_login_success_with_phone() {
    let text = compose(&login_ok(Some("919123456789")), "https://x.test/pricing");
    assert!(text.contains("Login successful"));
    assert!(text.contains("for 919123456789"));
}

#[test]
fn test_login_success_without_phone() {
    let text = compose(&login_ok(None), "");
    assert!(text.starts_with("✅ Login successful!"));
    assert!(!text.contains(" for "));
}

#[test]
fn test_login_success_never_leaks_link_or_token() {
    let text = compose(&login_ok(Some("919123456789")), "https://x.test/pricing");
    assert!(!text.contains("http"));
    assert!(!text.contains("www."));
    assert!(!text.contains("secret-session-token"));
    assert!(text.contains("computer"));
    assert!(text.contains("phone"));
}

#[test]
fn test_login_failure_uses_backend_message() {
    let outcome = Outcome::Login(VerificationResult::Failure {
        message: Some("Code expired".into()),
    });
    assert_eq!(compose(&outcome, ""), "❌ Login failed: Code expired");
}

#[test]
fn test_login_failure_default_message() {
    for message in [None, Some(String::new()), Some("  ".into())] {
        let outcome = Outcome::Login(VerificationResult::Failure { message });
        assert_eq!(
            compose(&outcome, ""),
            format!("❌ Login failed: {DEFAULT_LOGIN_FAILURE}")
        );
    }
}
