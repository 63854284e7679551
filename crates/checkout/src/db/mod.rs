//! Database operations for the embedded SQLite store.
//!
//! # Tables
//!
//! - `shopping_cart` - One row per live session token (unique), holding the
//!   payment intent id once checkout starts
//! - `cart_item` - Cart contents, cascade-deleted with the cart
//! - `order_label` - Append-only order reference counter
//!
//! # Migrations
//!
//! Migrations live in `crates/checkout/migrations/` and are embedded via
//! `sqlx::migrate!`; the binary runs them at startup (the store is an
//! embedded single-file database, there is no separate migration step).

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub mod carts;

pub use carts::{CartStore, MAX_CART_ITEMS};

/// Errors that can occur during store operations.
///
/// Callers branch on the kind, never on driver error text.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert collided with a unique constraint.
    #[error("record already exists")]
    Duplicate,

    /// The addressed row does not exist.
    #[error("row not exists")]
    NotExists,

    /// An update matched a row but changed nothing.
    #[error("update failed")]
    UpdateFailed,

    /// A delete removed nothing.
    #[error("delete failed")]
    DeleteFailed,

    /// The cart is at its item capacity.
    #[error("cart is at capacity")]
    CartFull,

    /// Stored data no longer parses (e.g. an item kind removed from the catalog).
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Opaque database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Embedded migrations for the checkout schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Create the SQLite pool.
///
/// The pool is sized to a single connection: the store is a single shared
/// embedded handle, and SQLite serializes writers regardless. The database
/// file is created on first run; foreign keys are enforced so cart deletion
/// cascades to items.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the file cannot be opened.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
