//! User-facing reply text. Pure functions of the command outcome.

use courier_backend::VerificationResult;

pub const STOP_CONFIRMED: &str = "✅ You have been unsubscribed from WhatsApp notifications. \
You will no longer receive messages from us here.";

pub const STOP_FAILED: &str =
    "⚠️ We couldn't process your unsubscribe request right now. Please try again later.";

pub const DEFAULT_LOGIN_FAILURE: &str = "Invalid or expired code.";

/// Shown after a successful login. Never carries a link: the session is
/// already bound on the device that requested the code.
const LOGIN_NEXT_STEPS: &str = "💻 Started on a computer? Go back to your browser, you are now signed in.\n\
📱 Started on this phone? Return to the app to continue.";

/// Result of running a classified command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Buy,
    StopConfirmed,
    StopFailed,
    Login(VerificationResult),
}

/// Reply text for `outcome`.
pub fn compose(outcome: &Outcome, purchase_url: &str) -> String {
    match outcome {
        Outcome::Buy => format!("🛒 Ready to upgrade? Choose a plan here:\n{purchase_url}"),
        Outcome::StopConfirmed => STOP_CONFIRMED.to_string(),
        Outcome::StopFailed => STOP_FAILED.to_string(),
        Outcome::Login(VerificationResult::Success { user_phone, .. }) => {
            let suffix = user_phone
                .as_deref()
                .map(|p| format!(" for {p}"))
                .unwrap_or_default();
            format!("✅ Login successful{suffix}!\n\n{LOGIN_NEXT_STEPS}")
        }
        Outcome::Login(VerificationResult::Failure { message }) => {
            let reason = message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_LOGIN_FAILURE);
            format!("❌ Login failed: {reason}")
        }
    }
}
