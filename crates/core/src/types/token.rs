//! Opaque per-browser session token.
//!
//! A session token is the URL-safe base64 encoding (padded) of 32 random
//! bytes, which is always exactly 44 characters. The token is a bearer
//! credential: it identifies a visitor's cart and nothing else, and is only
//! persisted once the visitor mutates a cart.
//!
//! Token *generation* requires a CSPRNG and therefore lives in the `checkout`
//! crate; this module only defines the validated wrapper type.

use thiserror::Error;

/// Length of a well-formed session token (base64 of 32 bytes, padded).
pub const SESSION_TOKEN_LEN: usize = 44;

/// Errors produced when validating a candidate session token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The candidate value was not exactly [`SESSION_TOKEN_LEN`] characters.
    #[error("session token must be exactly {SESSION_TOKEN_LEN} characters, got {0}")]
    InvalidLength(usize),
}

/// A validated session token.
///
/// Equality is exact-string. The `Debug` implementation truncates the value
/// so tokens never land in logs in full.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Validate a candidate token value.
    ///
    /// Only the length is checked; the cookie layer treats anything that is
    /// not exactly 44 characters as "no session" and mints a fresh token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidLength`] for any other length.
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        if value.len() == SESSION_TOKEN_LEN {
            Ok(Self(value.to_owned()))
        } else {
            Err(TokenError::InvalidLength(value.len()))
        }
    }

    /// Get the token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "SessionToken({prefix}…)")
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn well_formed() -> String {
        "A".repeat(SESSION_TOKEN_LEN)
    }

    #[test]
    fn test_parse_accepts_44_chars() {
        let token = SessionToken::parse(&well_formed()).unwrap();
        assert_eq!(token.as_str(), well_formed());
    }

    #[test]
    fn test_parse_rejects_other_lengths() {
        assert_eq!(
            SessionToken::parse("short"),
            Err(TokenError::InvalidLength(5))
        );
        assert_eq!(
            SessionToken::parse(&"A".repeat(45)),
            Err(TokenError::InvalidLength(45))
        );
        assert_eq!(SessionToken::parse(""), Err(TokenError::InvalidLength(0)));
    }

    #[test]
    fn test_debug_truncates_value() {
        let token = SessionToken::parse(&well_formed()).unwrap();
        let debug = format!("{token:?}");
        assert!(debug.len() < SESSION_TOKEN_LEN);
        assert!(!debug.contains(&well_formed()));
    }
}
