//! Phone number normalization and WhatsApp address derivation.
//!
//! The default-country-code rule is a heuristic: numbers of up to
//! `local_max_digits` digits that were not submitted with the default
//! country code get it prepended. It does not consult any numbering plan.

use crate::config::PhoneConfig;
use crate::error::RelayError;
use std::fmt;

/// Server suffix of a direct (one-to-one) WhatsApp address.
pub const DIRECT_SUFFIX: &str = "@s.whatsapp.net";

/// Canonical digits-only phone number: `<countrycode><localnumber>`, no leading zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Direct-message transport address for this number.
    pub fn address(&self) -> String {
        format!("{}{DIRECT_SUFFIX}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the phone digits of a transport address.
///
/// `"919123456789:12@s.whatsapp.net"` → `"919123456789"`. The device suffix
/// after `:` is dropped. Addresses on any other server (e.g. `@lid`) carry
/// no phone number and yield an empty string.
pub fn digits_from_address(address: &str) -> String {
    let (user, server) = match address.split_once('@') {
        Some((user, server)) => (user, Some(server)),
        None => (address, None),
    };
    if server.is_some_and(|s| Some(s) != DIRECT_SUFFIX.strip_prefix('@')) {
        return String::new();
    }
    let user = user.split(':').next().unwrap_or(user);
    user.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalizes user-supplied phone numbers.
#[derive(Debug, Clone)]
pub struct PhoneNormalizer {
    country_code: String,
    local_max_digits: usize,
}

impl PhoneNormalizer {
    /// Non-digits and trunk zeros in `country_code` are dropped (`"+091"` → `"91"`).
    pub fn new(country_code: &str, local_max_digits: usize) -> Self {
        let digits: String = country_code.chars().filter(|c| c.is_ascii_digit()).collect();
        Self {
            country_code: digits.trim_start_matches('0').to_string(),
            local_max_digits,
        }
    }

    pub fn from_config(config: &PhoneConfig) -> Self {
        Self::new(&config.default_country_code, config.local_max_digits)
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Canonicalize `raw` into a [`PhoneNumber`].
    ///
    /// Non-digits are stripped, then leading zeros. The default country code
    /// is prepended when the submitted digits did not start with it and at
    /// most `local_max_digits` digits remain.
    pub fn normalize(&self, raw: &str) -> Result<PhoneNumber, RelayError> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let local = digits.trim_start_matches('0');
        if local.is_empty() {
            return Err(RelayError::InvalidPhone(raw.to_string()));
        }

        let has_code = !self.country_code.is_empty() && digits.starts_with(&self.country_code);
        if !self.country_code.is_empty() && !has_code && local.len() <= self.local_max_digits {
            return Ok(PhoneNumber(format!("{}{local}", self.country_code)));
        }
        Ok(PhoneNumber(local.to_string()))
    }
}
