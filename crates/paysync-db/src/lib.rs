//! Postgres record store for payment records.
//!
//! One `payments` row per order id. Derived flags (`is_paid`,
//! `can_navigate_home`) are written alongside `status` on every insert and
//! update so the row is readable without the mapping table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paysync_reconcile::{PaymentRecordStore, StoreError};
use paysync_schemas::{
    CanonicalStatus, NewPaymentRecord, PaymentRecord, StatusInfo, StatusUpdate,
};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

pub const ENV_DB_URL: &str = "PAYSYNC_DATABASE_URL";

pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    tracing::info!("payments schema migrated");
    Ok(())
}

#[derive(Clone, Debug)]
pub struct PgPaymentStore {
    pool: PgPool,
}

impl PgPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn backend(op: &str, e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("{op}: {e}"))
}

fn to_json<T: serde::Serialize>(field: &str, v: &T) -> Result<Value, StoreError> {
    serde_json::to_value(v).map_err(|e| StoreError::Decode(format!("{field}: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(field: &str, v: Value) -> Result<T, StoreError> {
    serde_json::from_value(v).map_err(|e| StoreError::Decode(format!("{field}: {e}")))
}

fn decode_row(row: &PgRow) -> Result<PaymentRecord, StoreError> {
    let get_err = |e: sqlx::Error| StoreError::Decode(e.to_string());

    let status: String = row.try_get("status").map_err(get_err)?;
    let customer: Value = row.try_get("customer_details").map_err(get_err)?;
    let items: Value = row.try_get("item_details").map_err(get_err)?;
    let context: Value = row.try_get("context").map_err(get_err)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(get_err)?;
    let updated_at: Option<DateTime<Utc>> = row.try_get("updated_at").map_err(get_err)?;

    Ok(PaymentRecord {
        order_id: row.try_get("order_id").map_err(get_err)?,
        gross_amount: row.try_get("gross_amount").map_err(get_err)?,
        customer_details: from_json("customer_details", customer)?,
        item_details: from_json("item_details", items)?,
        context: from_json("context", context)?,
        status: CanonicalStatus::parse(&status),
        raw_transaction_status: row.try_get("transaction_status").map_err(get_err)?,
        snap_token: row.try_get("snap_token").map_err(get_err)?,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl PaymentRecordStore for PgPaymentStore {
    async fn insert(&self, record: &NewPaymentRecord) -> Result<(), StoreError> {
        let info = StatusInfo::for_status(record.status);
        sqlx::query(
            r#"
            insert into payments (
              order_id, gross_amount, customer_details, item_details, payment_type, context,
              status, is_paid, can_navigate_home, transaction_status, snap_token
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            )
            "#,
        )
        .bind(&record.order_id)
        .bind(record.gross_amount)
        .bind(to_json("customer_details", &record.customer_details)?)
        .bind(to_json("item_details", &record.item_details)?)
        .bind(record.context.payment_type())
        .bind(to_json("context", &record.context)?)
        .bind(record.status.as_str())
        .bind(info.is_paid())
        .bind(info.can_navigate_home())
        .bind(&record.raw_transaction_status)
        .bind(&record.snap_token)
        .execute(&self.pool)
        .await
        .map_err(|e| backend("insert payment", e))?;
        Ok(())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            select order_id, gross_amount, customer_details, item_details, context,
                   status, transaction_status, snap_token, created_at, updated_at
            from payments
            where order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("find payment", e))?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn update_status(&self, order_id: &str, update: &StatusUpdate) -> Result<bool, StoreError> {
        let info = StatusInfo::for_status(update.status);
        let res = sqlx::query(
            r#"
            update payments
               set status = $2,
                   is_paid = $3,
                   can_navigate_home = $4,
                   transaction_status = $5,
                   updated_at = now()
             where order_id = $1
            "#,
        )
        .bind(order_id)
        .bind(update.status.as_str())
        .bind(info.is_paid())
        .bind(info.can_navigate_home())
        .bind(update.raw_transaction_status.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| backend("update payment status", e))?;

        Ok(res.rows_affected() > 0)
    }
}
