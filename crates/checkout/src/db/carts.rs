//! Cart repository for database operations.
//!
//! All multi-step sequences (count-then-insert, resolve-then-update) run
//! inside a transaction; single-row mutations are expressed as one statement
//! so their not-found result is atomic. The unique constraint on
//! `shopping_cart.session_id` is the hard concurrency guard: an insert that
//! loses a race surfaces as [`StoreError::Duplicate`] and is resolved by
//! re-reading.

use sqlx::SqlitePool;

use driftpress_core::{CartId, CartItemId, ItemColor, ItemKind, ItemSize, SessionToken};

use super::StoreError;
use crate::models::{CartItem, ShoppingCart};

/// Hard cap on items per cart, enforced at write time.
pub const MAX_CART_ITEMS: i64 = 8;

/// Repository for cart, item, and order-label operations.
#[derive(Clone)]
pub struct CartStore {
    pool: SqlitePool,
}

/// Raw `shopping_cart` row before token validation.
#[derive(sqlx::FromRow)]
struct CartRow {
    id: i64,
    session_id: String,
    payment_intent_id: Option<String>,
}

impl TryFrom<CartRow> for ShoppingCart {
    type Error = StoreError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let session_id = SessionToken::parse(&row.session_id).map_err(|e| {
            StoreError::DataCorruption(format!("invalid session token in database: {e}"))
        })?;

        Ok(Self {
            id: CartId::new(row.id),
            session_id,
            payment_intent_id: row.payment_intent_id.filter(|id| !id.is_empty()),
        })
    }
}

/// Raw `cart_item` row before catalog validation.
#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    shopping_cart_id: i64,
    item: String,
    size: String,
    color: String,
}

impl TryFrom<ItemRow> for CartItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let corrupt =
            |e| StoreError::DataCorruption(format!("invalid cart item in database: {e}"));

        Ok(Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.shopping_cart_id),
            kind: row.item.parse().map_err(corrupt)?,
            size: row.size.parse().map_err(corrupt)?,
            color: row.color.parse().map_err(corrupt)?,
        })
    }
}

impl CartStore {
    /// Create a new cart store over the shared pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool (readiness checks).
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a cart by its session token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotExists`] when no cart is reachable from the
    /// token.
    pub async fn get_cart(&self, token: &SessionToken) -> Result<ShoppingCart, StoreError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, session_id, payment_intent_id FROM shopping_cart WHERE session_id = ?",
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotExists)?.try_into()
    }

    /// Get a cart by the payment intent id stored against it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotExists`] when no cart references the intent.
    pub async fn get_cart_by_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<ShoppingCart, StoreError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, session_id, payment_intent_id FROM shopping_cart WHERE payment_intent_id = ?",
        )
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotExists)?.try_into()
    }

    /// Get an existing cart for the token, creating an empty one on miss.
    ///
    /// Concurrent first-time calls race to insert; the loser hits the unique
    /// constraint and resolves it by re-reading the winner's row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on driver failure.
    pub async fn get_or_create_cart(
        &self,
        token: &SessionToken,
    ) -> Result<ShoppingCart, StoreError> {
        match self.get_cart(token).await {
            Err(StoreError::NotExists) => {}
            other => return other,
        }

        match self.insert_cart(token).await {
            // Lost the insert race; the row exists now.
            Err(StoreError::Duplicate) => self.get_cart(token).await,
            other => other,
        }
    }

    /// List the items in a cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on driver failure.
    pub async fn items_for_cart(&self, cart_id: CartId) -> Result<Vec<CartItem>, StoreError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, shopping_cart_id, item, size, color \
             FROM cart_item WHERE shopping_cart_id = ? ORDER BY id",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartItem::try_from).collect()
    }

    /// List the items reachable from a session token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotExists`] when the token has no cart yet
    /// (a normal state for a new visitor; callers map it to an empty cart).
    pub async fn items_for_session(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<CartItem>, StoreError> {
        let cart = self.get_cart(token).await?;
        self.items_for_cart(cart.id).await
    }

    /// List every cart (audit/reporting helper).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on driver failure.
    pub async fn all_carts(&self) -> Result<Vec<ShoppingCart>, StoreError> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT id, session_id, payment_intent_id FROM shopping_cart ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ShoppingCart::try_from).collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Add one item row to a cart.
    ///
    /// The capacity check and the insert share a transaction so a burst of
    /// concurrent adds cannot overfill the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CartFull`] at [`MAX_CART_ITEMS`].
    pub async fn add_item(
        &self,
        cart_id: CartId,
        kind: ItemKind,
        size: ItemSize,
        color: ItemColor,
    ) -> Result<CartItemId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cart_item WHERE shopping_cart_id = ?")
                .bind(cart_id)
                .fetch_one(&mut *tx)
                .await?;

        if count >= MAX_CART_ITEMS {
            return Err(StoreError::CartFull);
        }

        let result =
            sqlx::query("INSERT INTO cart_item (shopping_cart_id, item, size, color) VALUES (?, ?, ?, ?)")
                .bind(cart_id)
                .bind(kind.as_str())
                .bind(size.as_str())
                .bind(color.as_str())
                .execute(&mut *tx)
                .await?;

        let id = CartItemId::new(result.last_insert_rowid());
        tx.commit().await?;

        Ok(id)
    }

    /// Remove the first structural match of (kind, size, color) from a cart.
    ///
    /// Duplicates are legal; exactly one row (the lowest id) is removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotExists`] when no row matches.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        kind: ItemKind,
        size: ItemSize,
        color: ItemColor,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM cart_item WHERE id = (\
                 SELECT id FROM cart_item \
                 WHERE shopping_cart_id = ? AND item = ? AND size = ? AND color = ? \
                 ORDER BY id LIMIT 1)",
        )
        .bind(cart_id)
        .bind(kind.as_str())
        .bind(size.as_str())
        .bind(color.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotExists);
        }

        Ok(())
    }

    /// Store the payment intent id against the token's cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotExists`] when the token has no cart, or
    /// [`StoreError::UpdateFailed`] when the row vanished mid-update.
    pub async fn update_payment_intent(
        &self,
        token: &SessionToken,
        intent_id: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: i64 = sqlx::query_scalar("SELECT id FROM shopping_cart WHERE session_id = ?")
            .bind(token.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotExists)?;

        let result = sqlx::query("UPDATE shopping_cart SET payment_intent_id = ? WHERE id = ?")
            .bind(intent_id)
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UpdateFailed);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Replace a cart's session token (post-payment rotation only).
    ///
    /// The cart record persists under the new random token, so order history
    /// survives while the original browser session loses reach.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotExists`] when the old token has no cart,
    /// [`StoreError::Duplicate`] if the new token is already taken, or
    /// [`StoreError::UpdateFailed`] when the row vanished mid-update.
    pub async fn update_session_token(
        &self,
        old: &SessionToken,
        new: &SessionToken,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: i64 = sqlx::query_scalar("SELECT id FROM shopping_cart WHERE session_id = ?")
            .bind(old.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotExists)?;

        let result = sqlx::query("UPDATE shopping_cart SET session_id = ? WHERE id = ?")
            .bind(new.as_str())
            .bind(cart_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Duplicate;
                }
                StoreError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UpdateFailed);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Allocate the next order label for a cart.
    ///
    /// The counter is global (not per cart) and append-only; the label is
    /// zero-padded at the fulfillment boundary, not here.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on driver failure.
    pub async fn create_order_label(&self, cart_id: CartId) -> Result<i64, StoreError> {
        let result = sqlx::query("INSERT INTO order_label (shopping_cart_id) VALUES (?)")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Delete a cart outright, cascading to its items.
    ///
    /// Not part of the normal checkout flow (which rotates tokens instead);
    /// kept for operator cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeleteFailed`] when the token has no cart.
    pub async fn delete_cart(&self, token: &SessionToken) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM shopping_cart WHERE session_id = ?")
            .bind(token.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DeleteFailed);
        }

        Ok(())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    async fn insert_cart(&self, token: &SessionToken) -> Result<ShoppingCart, StoreError> {
        let result =
            sqlx::query("INSERT INTO shopping_cart (session_id, payment_intent_id) VALUES (?, NULL)")
                .bind(token.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.is_unique_violation()
                    {
                        return StoreError::Duplicate;
                    }
                    StoreError::Database(e)
                })?;

        Ok(ShoppingCart {
            id: CartId::new(result.last_insert_rowid()),
            session_id: token.clone(),
            payment_intent_id: None,
        })
    }
}
