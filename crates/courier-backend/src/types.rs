//! Wire types for the backend's bot endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/verify-hash-code`.
#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    pub hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<VerifyData>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyData {
    #[serde(default)]
    pub token: String,
    pub user: Option<VerifiedUser>,
}

#[derive(Debug, Deserialize)]
pub struct VerifiedUser {
    pub phone: Option<String>,
}

/// Body of `POST /bot/whatsapp-optout`.
#[derive(Debug, Serialize)]
pub struct OptOutRequest<'a> {
    pub phone: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct OptOutResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

/// A login the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLogin {
    pub token: String,
    /// Phone the backend has on file for the user, if any.
    pub user_phone: Option<String>,
}

impl From<VerifyData> for VerifiedLogin {
    fn from(data: VerifyData) -> Self {
        Self {
            token: data.token,
            user_phone: data
                .user
                .and_then(|u| u.phone)
                .filter(|p| !p.trim().is_empty()),
        }
    }
}
