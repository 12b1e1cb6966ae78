use std::sync::Arc;

use async_trait::async_trait;
use paysync_schemas::{NewPaymentRecord, PaymentRecord, StatusUpdate};

use crate::error::StoreError;

/// Persistence for payment records, keyed by `order_id`.
///
/// Lookups are exact-match on `order_id`; updates touch a single record.
/// Implementations assign `created_at` / `updated_at` themselves.
#[async_trait]
pub trait PaymentRecordStore: Send + Sync {
    async fn insert(&self, record: &NewPaymentRecord) -> Result<(), StoreError>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError>;

    /// Apply `update` to the record for `order_id`. `Ok(false)` when no
    /// record matched.
    async fn update_status(&self, order_id: &str, update: &StatusUpdate) -> Result<bool, StoreError>;
}

/// The record store as handed to the engine: either a live connection or
/// explicitly switched off (no credentials, or connect failed at boot).
#[derive(Clone)]
pub enum RecordStore {
    Connected(Arc<dyn PaymentRecordStore>),
    Disabled,
}

impl RecordStore {
    pub fn connected<S>(store: S) -> Self
    where
        S: PaymentRecordStore + 'static,
    {
        RecordStore::Connected(Arc::new(store))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, RecordStore::Connected(_))
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStore::Connected(_) => f.write_str("RecordStore::Connected"),
            RecordStore::Disabled => f.write_str("RecordStore::Disabled"),
        }
    }
}
