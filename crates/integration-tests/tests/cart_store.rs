//! Store invariants over in-memory SQLite.

use driftpress_checkout::db::{MAX_CART_ITEMS, StoreError};
use driftpress_checkout::middleware::session::generate_token;
use driftpress_core::{ItemColor, ItemKind, ItemSize};
use driftpress_integration_tests::TestContext;

#[tokio::test]
async fn test_get_or_create_cart_is_idempotent() {
    let ctx = TestContext::new().await;
    let token = generate_token().expect("token");

    let first = ctx.store.get_or_create_cart(&token).await.expect("create");
    let second = ctx.store.get_or_create_cart(&token).await.expect("read");

    assert_eq!(first.id, second.id);
    assert_eq!(ctx.store.all_carts().await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_cart_capacity_is_eight() {
    let ctx = TestContext::new().await;
    let token = generate_token().expect("token");
    let cart = ctx.store.get_or_create_cart(&token).await.expect("create");

    for _ in 0..MAX_CART_ITEMS {
        ctx.store
            .add_item(cart.id, ItemKind::Tshirt, ItemSize::M, ItemColor::Red)
            .await
            .expect("add within capacity");
    }

    let ninth = ctx
        .store
        .add_item(cart.id, ItemKind::Tshirt, ItemSize::M, ItemColor::Red)
        .await;
    assert!(matches!(ninth, Err(StoreError::CartFull)));

    let items = ctx.store.items_for_cart(cart.id).await.expect("list");
    assert_eq!(items.len(), usize::try_from(MAX_CART_ITEMS).expect("cap"));
}

#[tokio::test]
async fn test_remove_missing_item_leaves_cart_unchanged() {
    let ctx = TestContext::new().await;
    let token = generate_token().expect("token");
    let cart = ctx.store.get_or_create_cart(&token).await.expect("create");

    ctx.store
        .add_item(cart.id, ItemKind::Hoodie, ItemSize::M, ItemColor::Black)
        .await
        .expect("add");

    let result = ctx
        .store
        .remove_item(cart.id, ItemKind::Tshirt, ItemSize::S, ItemColor::Red)
        .await;
    assert!(matches!(result, Err(StoreError::NotExists)));

    let items = ctx.store.items_for_cart(cart.id).await.expect("list");
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_remove_with_duplicates_deletes_exactly_one() {
    let ctx = TestContext::new().await;
    let token = generate_token().expect("token");
    let cart = ctx.store.get_or_create_cart(&token).await.expect("create");

    let first = ctx
        .store
        .add_item(cart.id, ItemKind::Hoodie, ItemSize::M, ItemColor::Black)
        .await
        .expect("add");
    let second = ctx
        .store
        .add_item(cart.id, ItemKind::Hoodie, ItemSize::M, ItemColor::Black)
        .await
        .expect("add duplicate");
    ctx.store
        .add_item(cart.id, ItemKind::Tshirt, ItemSize::S, ItemColor::Red)
        .await
        .expect("add other");

    ctx.store
        .remove_item(cart.id, ItemKind::Hoodie, ItemSize::M, ItemColor::Black)
        .await
        .expect("remove one");

    let items = ctx.store.items_for_cart(cart.id).await.expect("list");
    assert_eq!(items.len(), 2);
    // The first (lowest-id) duplicate went; its twin survives.
    assert!(items.iter().all(|item| item.id != first));
    assert!(items.iter().any(|item| item.id == second));
}

#[tokio::test]
async fn test_payment_intent_roundtrip() {
    let ctx = TestContext::new().await;
    let token = generate_token().expect("token");
    let cart = ctx.store.get_or_create_cart(&token).await.expect("create");

    ctx.store
        .update_payment_intent(&token, "pi_test_42")
        .await
        .expect("attach intent");

    let resolved = ctx
        .store
        .get_cart_by_payment_intent("pi_test_42")
        .await
        .expect("resolve");
    assert_eq!(resolved.id, cart.id);
    assert_eq!(resolved.payment_intent_id.as_deref(), Some("pi_test_42"));

    assert!(matches!(
        ctx.store.get_cart_by_payment_intent("pi_other").await,
        Err(StoreError::NotExists)
    ));

    let stranger = generate_token().expect("token");
    assert!(matches!(
        ctx.store.update_payment_intent(&stranger, "pi_x").await,
        Err(StoreError::NotExists)
    ));
}

#[tokio::test]
async fn test_session_rotation_moves_cart_out_of_reach() {
    let ctx = TestContext::new().await;
    let old = generate_token().expect("token");
    let cart = ctx.store.get_or_create_cart(&old).await.expect("create");
    ctx.store
        .add_item(cart.id, ItemKind::Sweatshirt, ItemSize::L, ItemColor::Green)
        .await
        .expect("add");

    let fresh = generate_token().expect("token");
    ctx.store
        .update_session_token(&old, &fresh)
        .await
        .expect("rotate");

    assert!(matches!(
        ctx.store.get_cart(&old).await,
        Err(StoreError::NotExists)
    ));

    let reached = ctx.store.get_cart(&fresh).await.expect("reach via new token");
    assert_eq!(reached.id, cart.id);
    assert_eq!(
        ctx.store.items_for_cart(cart.id).await.expect("items").len(),
        1
    );
}

#[tokio::test]
async fn test_rotation_to_taken_token_is_duplicate() {
    let ctx = TestContext::new().await;
    let a = generate_token().expect("token");
    let b = generate_token().expect("token");
    ctx.store.get_or_create_cart(&a).await.expect("cart a");
    ctx.store.get_or_create_cart(&b).await.expect("cart b");

    assert!(matches!(
        ctx.store.update_session_token(&a, &b).await,
        Err(StoreError::Duplicate)
    ));
}

#[tokio::test]
async fn test_order_labels_are_monotonic_and_global() {
    let ctx = TestContext::new().await;
    let first_cart = ctx
        .store
        .get_or_create_cart(&generate_token().expect("token"))
        .await
        .expect("cart");
    let second_cart = ctx
        .store
        .get_or_create_cart(&generate_token().expect("token"))
        .await
        .expect("cart");

    let one = ctx
        .store
        .create_order_label(first_cart.id)
        .await
        .expect("label");
    let two = ctx
        .store
        .create_order_label(second_cart.id)
        .await
        .expect("label");
    let three = ctx
        .store
        .create_order_label(first_cart.id)
        .await
        .expect("label");

    assert!(one < two && two < three, "labels must increase globally");
    assert_eq!(ctx.order_label_count().await, 3);
}

#[tokio::test]
async fn test_delete_cart_cascades_to_items() {
    let ctx = TestContext::new().await;
    let token = generate_token().expect("token");
    let cart = ctx.store.get_or_create_cart(&token).await.expect("create");
    ctx.store
        .add_item(cart.id, ItemKind::Hoodie, ItemSize::S, ItemColor::Red)
        .await
        .expect("add");
    ctx.store
        .add_item(cart.id, ItemKind::Tshirt, ItemSize::M, ItemColor::Black)
        .await
        .expect("add");

    ctx.store.delete_cart(&token).await.expect("delete");

    assert!(ctx.store.all_carts().await.expect("list").is_empty());
    assert!(
        ctx.store
            .items_for_cart(cart.id)
            .await
            .expect("orphan query")
            .is_empty(),
        "items must cascade with the cart"
    );

    assert!(matches!(
        ctx.store.delete_cart(&token).await,
        Err(StoreError::DeleteFailed)
    ));
}

#[tokio::test]
async fn test_unknown_stored_item_surfaces_as_corruption() {
    let ctx = TestContext::new().await;
    let token = generate_token().expect("token");
    let cart = ctx.store.get_or_create_cart(&token).await.expect("create");

    // A row written before a lineup change no longer parses.
    sqlx::query("INSERT INTO cart_item (shopping_cart_id, item, size, color) VALUES (?, ?, ?, ?)")
        .bind(cart.id.as_i64())
        .bind("mug")
        .bind("s")
        .bind("black")
        .execute(&ctx.pool)
        .await
        .expect("raw insert");

    assert!(matches!(
        ctx.store.items_for_cart(cart.id).await,
        Err(StoreError::DataCorruption(_))
    ));
}
