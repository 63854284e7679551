//! Double-submit CSRF protection for the site API.
//!
//! A random token cookie is minted on first contact and echoed back in an
//! `X-CSRF-Token` response header; state-changing requests must replay the
//! header once the cookie exists. A request with no token cookie has no
//! session to ride, so it passes and receives a token. The webhook listener
//! never uses this layer - it authenticates payloads by signature.

use axum::{
    extract::Request,
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;

/// CSRF cookie name.
pub const CSRF_COOKIE_NAME: &str = "csrf";

/// Header the client replays the token in; also set on every API response.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Validate and refresh the double-submit token around an API request.
pub async fn csrf_middleware(jar: CookieJar, request: Request, next: Next) -> Response {
    let existing = jar.get(CSRF_COOKIE_NAME).map(|c| c.value().to_owned());

    if let Some(ref token) = existing
        && request.method() != Method::GET
        && request.method() != Method::HEAD
    {
        let header = request
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !constant_time_eq(token, header) {
            tracing::warn!(path = %request.uri().path(), "rejected request with stale CSRF token");
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        }
    }

    let (token, jar) = match existing {
        Some(token) => (token, jar),
        None => {
            let token = mint_token();
            let jar = jar.add(csrf_cookie(&token));
            (token, jar)
        }
    };

    let mut response = (jar, next.run(request).await).into_response();
    if let Ok(value) = HeaderValue::from_str(&token) {
        response.headers_mut().insert(CSRF_HEADER, value);
    }

    response
}

/// Generate a random CSRF token (128-bit, URL-safe base64).
fn mint_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

fn csrf_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE_NAME, token.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}
