//! PgPaymentStore against a live Postgres.
//!
//! DB-backed tests, skipped if PAYSYNC_DATABASE_URL is not set.

use paysync_db::PgPaymentStore;
use paysync_reconcile::PaymentRecordStore;
use paysync_schemas::{
    CanonicalStatus, CustomerDetails, EventContext, ItemDetail, NewPaymentRecord, PaymentContext,
    StatusUpdate,
};
use serde_json::{json, Map};

async fn store_or_skip() -> anyhow::Result<Option<PgPaymentStore>> {
    let url = match std::env::var(paysync_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: PAYSYNC_DATABASE_URL not set");
            return Ok(None);
        }
    };
    let pool = paysync_db::connect(&url, 2).await?;
    paysync_db::migrate(&pool).await?;
    Ok(Some(PgPaymentStore::new(pool)))
}

fn unique_order_id(tag: &str) -> String {
    format!("TEST-{tag}-{}", uuid::Uuid::new_v4().simple())
}

fn pending_record(order_id: &str) -> NewPaymentRecord {
    NewPaymentRecord {
        order_id: order_id.to_string(),
        gross_amount: 25000,
        customer_details: CustomerDetails {
            first_name: Some("Sari".into()),
            email: Some("sari@example.com".into()),
            phone: None,
            extra: serde_json::from_value(json!({"userId": "u-7"})).unwrap(),
        },
        item_details: vec![ItemDetail {
            id: Some("EV-2".into()),
            price: 25000,
            quantity: 1,
            name: Some("Workshop".into()),
            extra: Map::new(),
        }],
        context: PaymentContext::Event(EventContext {
            user_id: Some("u-7".into()),
            event_id: Some("EV-2".into()),
            event_name: Some("Workshop".into()),
            event_data: None,
            user_email: Some("sari@example.com".into()),
            user_name: Some("Sari".into()),
            quantity: 1,
            total_amount: 25000,
            is_free: false,
        }),
        status: CanonicalStatus::Pending,
        raw_transaction_status: "pending".into(),
        snap_token: "snap-abc".into(),
    }
}

// ----------------------------------------------------------------------------
// insert + find
// ----------------------------------------------------------------------------

#[tokio::test]
async fn inserted_record_reads_back_with_context() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };
    let order_id = unique_order_id("RT");
    store.insert(&pending_record(&order_id)).await?;

    let rec = store
        .find_by_order_id(&order_id)
        .await?
        .expect("record must exist");
    assert_eq!(rec.status, CanonicalStatus::Pending);
    assert!(!rec.is_paid());
    assert_eq!(rec.raw_transaction_status.as_deref(), Some("pending"));
    assert_eq!(rec.snap_token.as_deref(), Some("snap-abc"));
    assert_eq!(rec.context.payment_type(), "event");
    assert!(rec.updated_at.is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_order_is_none() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };
    assert!(store.find_by_order_id(&unique_order_id("NONE")).await?.is_none());
    Ok(())
}

// ----------------------------------------------------------------------------
// update_status
// ----------------------------------------------------------------------------

#[tokio::test]
async fn settlement_update_marks_paid() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };
    let order_id = unique_order_id("UPD");
    store.insert(&pending_record(&order_id)).await?;

    let update = StatusUpdate {
        status: CanonicalStatus::Success,
        raw_transaction_status: Some("settlement".into()),
    };
    assert!(store.update_status(&order_id, &update).await?);

    let rec = store.find_by_order_id(&order_id).await?.expect("record");
    assert_eq!(rec.status, CanonicalStatus::Success);
    assert!(rec.is_paid());
    assert!(rec.can_navigate_home());
    assert_eq!(rec.raw_transaction_status.as_deref(), Some("settlement"));
    assert!(rec.updated_at.is_some());

    let (paid,): (bool,) = sqlx::query_as("select is_paid from payments where order_id = $1")
        .bind(&order_id)
        .fetch_one(store.pool())
        .await?;
    assert!(paid, "derived column written with status");
    Ok(())
}

#[tokio::test]
async fn update_without_raw_status_clears_it() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };
    let order_id = unique_order_id("CLR");
    store.insert(&pending_record(&order_id)).await?;
    store
        .update_status(
            &order_id,
            &StatusUpdate {
                status: CanonicalStatus::Success,
                raw_transaction_status: Some("settlement".into()),
            },
        )
        .await?;

    let bare = StatusUpdate {
        status: CanonicalStatus::Unknown,
        raw_transaction_status: None,
    };
    assert!(store.update_status(&order_id, &bare).await?);

    let rec = store.find_by_order_id(&order_id).await?.expect("record");
    assert_eq!(rec.status, CanonicalStatus::Unknown);
    assert_eq!(rec.raw_transaction_status, None);
    assert!(!rec.is_paid());
    Ok(())
}

#[tokio::test]
async fn update_of_unknown_order_reports_no_match() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };
    let update = StatusUpdate {
        status: CanonicalStatus::Failed,
        raw_transaction_status: Some("deny".into()),
    };
    assert!(!store.update_status(&unique_order_id("MISS"), &update).await?);
    Ok(())
}

#[tokio::test]
async fn migrate_is_idempotent() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };
    paysync_db::migrate(store.pool()).await?;
    Ok(())
}
