//! Inbound chat commands: classification and reply text.

pub mod replies;

#[cfg(test)]
mod tests;

/// Minimum length of a bare login code.
const MIN_BARE_CODE_LEN: usize = 6;

/// What an inbound message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the purchase link.
    Buy,
    /// Opt out of notifications.
    Stop,
    /// Complete a login with this code.
    Login(String),
    /// Not a command; no reply.
    Ignore,
}

impl Command {
    /// Classify message text. Pure; first matching rule wins.
    pub fn classify(text: &str) -> Self {
        let body = text.trim();
        let lower = body.to_lowercase();

        match lower.as_str() {
            "buy" | "/buy" | "buy plan" => return Self::Buy,
            "stop" | "/stop" | "unsubscribe" => return Self::Stop,
            _ => {}
        }

        let mut words = body.split_whitespace();
        if words
            .next()
            .is_some_and(|first| first.eq_ignore_ascii_case("/login"))
        {
            if let Some(code) = words.next() {
                return Self::Login(code.trim().to_string());
            }
        }

        if body.chars().count() >= MIN_BARE_CODE_LEN
            && body.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Self::Login(body.to_string());
        }

        Self::Ignore
    }
}
