//! Driftpress checkout library.
//!
//! This crate provides the checkout backend as a library, allowing it to be
//! tested and reused. The binary in `main.rs` wires it to configuration,
//! logging, and the two HTTP listeners.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
