//! HTTP middleware for the checkout listeners.
//!
//! # Layers (site listener, bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, added in main)
//! 2. `TraceLayer` (request tracing)
//! 3. CSRF double-submit validation (API routes only)
//!
//! The webhook listener carries only the trace layer; its authentication is
//! payload signature verification, not cookies.

pub mod csrf;
pub mod session;

pub use csrf::{CSRF_COOKIE_NAME, CSRF_HEADER, csrf_middleware};
pub use session::{SESSION_COOKIE_NAME, SessionError, begin_session, generate_token};
