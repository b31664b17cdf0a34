//! Keyset Stream Tests
//!
//! Chained cursors must traverse every application exactly once in
//! (createdAt desc, id desc) order, even with inserts between fetches.

mod common;

use bank_ticket_core::constants::messages::INVALID_CURSOR;
use bank_ticket_core::models::{Application, ApplicationHistory, ApplicationView, Product, User};
use bank_ticket_core::pagination::{Cursor, KeysetPosition};
use bank_ticket_core::repository::ApplicationStore;
use bank_ticket_core::TicketError;
use chrono::{SubsecRound, Utc};
use common::*;
use proptest::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

/// Follow cursors from `start` until an empty batch
async fn drain(ctx: &TestContext, start: Option<String>, limit: u32) -> Vec<ApplicationView> {
    let mut cursor = start;
    let mut seen = Vec::new();
    loop {
        let page = ctx
            .services
            .applications
            .stream(cursor.as_deref(), limit)
            .await
            .unwrap();
        if page.is_end() {
            assert!(page.next_cursor.is_none());
            return seen;
        }
        cursor = page.next_cursor.clone();
        seen.extend(page.items);
    }
}

async fn seed(ctx: &TestContext, count: usize) -> (User, Product) {
    let client = UserBuilder::client().build(ctx).await;
    let product = ProductBuilder::new().build(ctx).await;
    for _ in 0..count {
        submit_application(ctx, &client, &product).await;
    }
    (client, product)
}

fn is_stream_ordered(items: &[ApplicationView]) -> bool {
    items.windows(2).all(|pair| {
        (pair[0].created_at, pair[0].id) > (pair[1].created_at, pair[1].id)
    })
}

#[tokio::test]
async fn test_stream_traverses_everything_once_in_order() {
    let ctx = TestContext::new();
    seed(&ctx, 23).await;

    let all = drain(&ctx, None, 5).await;
    assert_eq!(all.len(), 23);
    assert!(is_stream_ordered(&all));
    let unique: HashSet<Uuid> = all.iter().map(|a| a.id).collect();
    assert_eq!(unique.len(), 23);
}

#[tokio::test]
async fn test_inserts_between_fetches_neither_skip_nor_repeat() {
    let ctx = TestContext::new();
    let (client, product) = seed(&ctx, 12).await;
    let snapshot: HashSet<Uuid> = drain(&ctx, None, 50).await.iter().map(|a| a.id).collect();

    let first = ctx.services.applications.stream(None, 4).await.unwrap();
    assert_eq!(first.items.len(), 4);

    // New rows land ahead of the cursor and must not shift later pages
    for _ in 0..6 {
        submit_application(&ctx, &client, &product).await;
    }

    let rest = drain(&ctx, first.next_cursor.clone(), 4).await;
    let mut ids: Vec<Uuid> = first.items.iter().map(|a| a.id).collect();
    ids.extend(rest.iter().map(|a| a.id));

    let unique: HashSet<Uuid> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len(), "no id may repeat");
    assert_eq!(unique, snapshot, "every pre-existing id is visited");
}

#[tokio::test]
async fn test_equal_timestamps_are_ordered_by_id() {
    let ctx = TestContext::new();
    let client = UserBuilder::client().build(&ctx).await;
    let product = ProductBuilder::new().build(&ctx).await;
    let created_at = Utc::now().trunc_subsecs(6);

    for _ in 0..7 {
        let mut app = Application::submit(client.id, product.id, None, vec![], vec![]);
        app.created_at = created_at;
        let initial = ApplicationHistory::initial(app.id, app.status, client.role);
        ctx.store.insert_application(&app, &initial).await.unwrap();
    }

    let all = drain(&ctx, None, 2).await;
    assert_eq!(all.len(), 7);
    assert!(all.iter().all(|a| a.created_at == created_at));
    assert!(all.windows(2).all(|pair| pair[0].id > pair[1].id));
}

#[tokio::test]
async fn test_limit_is_clamped_not_rejected() {
    let ctx = TestContext::new();
    seed(&ctx, 55).await;
    let apps = &ctx.services.applications;

    assert_eq!(apps.stream(None, 500).await.unwrap().items.len(), 50);
    assert_eq!(apps.stream(None, 0).await.unwrap().items.len(), 1);
    assert_eq!(apps.stream(Some("   "), 3).await.unwrap().items.len(), 3);
}

#[tokio::test]
async fn test_next_cursor_encodes_last_item() {
    let ctx = TestContext::new();
    seed(&ctx, 3).await;

    let page = ctx.services.applications.stream(None, 2).await.unwrap();
    let last = page.items.last().unwrap();
    let cursor = page.next_cursor.as_deref().unwrap();

    assert_eq!(
        Cursor::decode_str(cursor).unwrap(),
        KeysetPosition::new(last.created_at, last.id)
    );
}

#[tokio::test]
async fn test_malformed_cursor_is_bad_request() {
    let ctx = TestContext::new();
    seed(&ctx, 2).await;

    for cursor in ["***", "bm90LWEtY3Vyc29y", "MjAyNC0wMS0xNVQxMDowMDowMFp8eHl6"] {
        let err = ctx
            .services
            .applications
            .stream(Some(cursor), 10)
            .await
            .unwrap_err();
        assert_eq!(err, TicketError::bad_request(INVALID_CURSOR));
    }
}

#[tokio::test]
async fn test_empty_store_ends_immediately() {
    let ctx = TestContext::new();
    let page = ctx.services.applications.stream(None, 10).await.unwrap();
    assert!(page.is_end());
    assert!(page.next_cursor.is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: any batch size visits every application exactly once, in order
    #[test]
    fn chained_cursors_cover_all_rows(count in 0usize..40, limit in 1u32..12) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (all, expected) = runtime.block_on(async {
            let ctx = TestContext::new();
            seed(&ctx, count).await;
            (drain(&ctx, None, limit).await, count)
        });

        prop_assert_eq!(all.len(), expected);
        prop_assert!(is_stream_ordered(&all));
    }
}
