//! Driftpress Core - Shared types library.
//!
//! This crate provides common types used across the Driftpress checkout
//! components:
//! - `checkout` - HTTP API, cart store, and payment orchestration
//! - `integration-tests` - Cross-module test harness
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. Anything that touches the outside world (token generation, SQL,
//! payment APIs) lives in the `checkout` crate.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, the session token, the product catalog, shipping
//!   addresses, and minor-unit money formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
