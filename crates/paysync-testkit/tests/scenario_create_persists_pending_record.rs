//! Scenario: create trigger.
//!
//! # Invariants under test
//!
//! 1. A successful create persists exactly one pending, unpaid record that
//!    carries the snap token and the payment-type context.
//! 2. Validation failures never reach the gateway.
//! 3. A gateway failure leaves the store untouched.
//! 4. A store failure after a successful create does not fail the request.

use std::sync::Arc;

use paysync_reconcile::{
    CreatePaymentRequest, GatewayError, ReconcileError, ReconciliationEngine, RecordStore,
};
use paysync_schemas::{CanonicalStatus, PaymentContext};
use paysync_testkit::{
    create_request, event_create_request, GatewayFault, InMemoryStore, ScriptedGateway,
    TEST_SERVER_KEY,
};

fn engine(gw: &ScriptedGateway, store: &InMemoryStore) -> ReconciliationEngine {
    ReconciliationEngine::new(
        Arc::new(gw.clone()),
        RecordStore::connected(store.clone()),
        TEST_SERVER_KEY,
    )
    .with_finish_base_url("https://shop.example/")
}

// ---------------------------------------------------------------------------
// 1. success path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_persists_pending_record_with_token() {
    let gw = ScriptedGateway::new();
    let store = InMemoryStore::new();

    let created = engine(&gw, &store)
        .on_create(create_request("ORDER-100", 50000))
        .await
        .expect("create");

    assert_eq!(created.snap_token, "snap-ORDER-100");
    assert!(created.record_persisted);

    let rec = store.get("ORDER-100").expect("record persisted");
    assert_eq!(rec.status, CanonicalStatus::Pending);
    assert!(!rec.is_paid());
    assert!(!rec.can_navigate_home());
    assert_eq!(rec.snap_token.as_deref(), Some("snap-ORDER-100"));
    assert_eq!(rec.context, PaymentContext::General);
    assert_eq!(store.len(), 1);

    let sent = gw.last_create().expect("gateway called");
    assert_eq!(
        sent.finish_url.as_deref(),
        Some("https://shop.example/payment-finish?order_id=ORDER-100")
    );
}

#[tokio::test]
async fn event_payment_is_tagged_with_event_context() {
    let gw = ScriptedGateway::new();
    let store = InMemoryStore::new();

    engine(&gw, &store)
        .on_create(event_create_request("EVT-1", 75000, "EV-42"))
        .await
        .expect("create");

    let rec = store.get("EVT-1").expect("record");
    let PaymentContext::Event(ev) = rec.context else {
        panic!("expected event context, got {:?}", rec.context);
    };
    assert_eq!(ev.event_id.as_deref(), Some("EV-42"));
    assert_eq!(ev.user_id.as_deref(), Some("user-1"));
    assert_eq!(ev.total_amount, 75000);
    assert!(!ev.is_free);
}

#[tokio::test]
async fn zero_amount_is_accepted() {
    let gw = ScriptedGateway::new();
    let store = InMemoryStore::new();
    engine(&gw, &store)
        .on_create(create_request("FREE-1", 0))
        .await
        .expect("zero amount allowed");
    assert_eq!(gw.create_calls(), 1);
}

// ---------------------------------------------------------------------------
// 2. validation before any IO
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_order_id_is_rejected_before_gateway() {
    let gw = ScriptedGateway::new();
    let store = InMemoryStore::new();

    let err = engine(&gw, &store)
        .on_create(create_request("bad id!", 10000))
        .await
        .expect_err("must reject");

    match err {
        ReconcileError::Validation(msg) => assert!(msg.starts_with("Invalid order_id format")),
        other => panic!("expected Validation, got {other:?}"),
    }
    assert_eq!(gw.create_calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn missing_fields_are_rejected_before_gateway() {
    let gw = ScriptedGateway::new();
    let store = InMemoryStore::new();
    let mut req = create_request("ORDER-101", 10000);
    req.item_details = None;

    let err = engine(&gw, &store).on_create(req).await.expect_err("must reject");
    assert!(
        matches!(&err, ReconcileError::Validation(m) if m.starts_with("Missing required fields")),
        "got {err:?}"
    );

    let err = engine(&gw, &store)
        .on_create(CreatePaymentRequest::default())
        .await
        .expect_err("empty body");
    assert!(matches!(err, ReconcileError::Validation(_)));
    assert_eq!(gw.create_calls(), 0);
}

#[tokio::test]
async fn negative_amount_is_rejected() {
    let gw = ScriptedGateway::new();
    let store = InMemoryStore::new();
    let err = engine(&gw, &store)
        .on_create(create_request("ORDER-102", -1))
        .await
        .expect_err("must reject");
    assert!(matches!(err, ReconcileError::Validation(_)));
    assert_eq!(gw.create_calls(), 0);
}

// ---------------------------------------------------------------------------
// 3 + 4. failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gateway_failure_persists_nothing() {
    let gw = ScriptedGateway::new();
    gw.fail_create(Some(GatewayFault::Rejected {
        status: 400,
        messages: vec!["transaction_details.order_id has already been taken".into()],
    }));
    let store = InMemoryStore::new();

    let err = engine(&gw, &store)
        .on_create(create_request("ORDER-103", 10000))
        .await
        .expect_err("gateway rejected");
    match err {
        ReconcileError::Gateway(g @ GatewayError::Rejected { .. }) => {
            assert_eq!(
                g.detail(),
                serde_json::json!(["transaction_details.order_id has already been taken"])
            );
        }
        other => panic!("expected Gateway(Rejected), got {other:?}"),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn store_failure_does_not_fail_create() {
    let gw = ScriptedGateway::new();
    let store = InMemoryStore::new();
    store.set_failing(true);

    let created = engine(&gw, &store)
        .on_create(create_request("ORDER-104", 10000))
        .await
        .expect("create must still succeed");
    assert_eq!(created.snap_token, "snap-ORDER-104");
    assert!(!created.record_persisted);
}

#[tokio::test]
async fn disabled_store_still_returns_token() {
    let gw = ScriptedGateway::new();
    let engine = ReconciliationEngine::new(Arc::new(gw.clone()), RecordStore::Disabled, TEST_SERVER_KEY);
    assert!(!engine.store_enabled());

    let created = engine
        .on_create(create_request("ORDER-105", 10000))
        .await
        .expect("create");
    assert!(!created.record_persisted);
    assert_eq!(gw.create_calls(), 1);
    assert!(gw
        .last_create()
        .is_some_and(|tx| tx.finish_url.is_none()));
}
