//! Session identity carried in a bare cookie.
//!
//! Unlike a server-side session store, the `session` cookie *is* the
//! identity: an opaque 44-character token that keys the visitor's cart. The
//! token is only written to the database once the visitor mutates a cart, so
//! merely browsing never creates rows.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::TryRngCore;
use rand::rngs::OsRng;
use thiserror::Error;
use time::Duration;

use driftpress_core::{SESSION_TOKEN_LEN, SessionToken};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Session cookie lifetime.
const SESSION_TTL: Duration = Duration::days(7);

/// Errors minting a session token.
///
/// Token generation is fallible: if the OS CSPRNG is unavailable the request
/// fails instead of proceeding with a guessable (or empty) credential.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("system randomness unavailable: {0}")]
    Csprng(String),
}

/// Generate a fresh random session token (32 CSPRNG bytes, URL-safe base64).
///
/// # Errors
///
/// Returns [`SessionError::Csprng`] when the OS randomness source fails.
pub fn generate_token() -> Result<SessionToken, SessionError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::Csprng(e.to_string()))?;

    let encoded = URL_SAFE.encode(bytes);
    debug_assert_eq!(encoded.len(), SESSION_TOKEN_LEN);

    SessionToken::parse(&encoded).map_err(|e| SessionError::Csprng(e.to_string()))
}

/// Resolve the request's session, minting a cookie when needed.
///
/// A well-formed 44-character cookie value is returned verbatim; anything
/// else (absent, truncated, oversized) is replaced with a fresh token that is
/// added to the jar for the response.
///
/// # Errors
///
/// Returns [`SessionError::Csprng`] when a fresh token is needed and the
/// randomness source fails.
pub fn begin_session(jar: CookieJar) -> Result<(SessionToken, CookieJar), SessionError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME)
        && let Ok(token) = SessionToken::parse(cookie.value())
    {
        return Ok((token, jar));
    }

    let token = generate_token()?;
    tracing::debug!(token = ?token, "minted new session cookie");
    let jar = jar.add(session_cookie(&token));
    Ok((token, jar))
}

fn session_cookie(token: &SessionToken) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(SESSION_TTL)
        .build()
}
