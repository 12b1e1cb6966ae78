use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use paysync_mail::{EmailMessage, MailError, Mailer};
use paysync_reconcile::{GatewayError, PaymentGateway, PaymentRecordStore, StoreError};
use paysync_schemas::{
    CreateTransaction, GatewayStatus, NewPaymentRecord, PaymentRecord, StatusUpdate,
    TransactionToken,
};
use serde_json::json;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<BTreeMap<String, PaymentRecord>>>,
    failing: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call returns `StoreError::Backend`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, order_id: &str) -> Option<PaymentRecord> {
        lock(&self.records).get(order_id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful inserts plus updates that matched a record.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Insert directly, bypassing the failure toggle.
    pub fn seed(&self, record: &NewPaymentRecord) {
        lock(&self.records).insert(record.order_id.clone(), materialise(record));
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("in-memory store set to fail".to_string()));
        }
        Ok(())
    }
}

fn materialise(r: &NewPaymentRecord) -> PaymentRecord {
    PaymentRecord {
        order_id: r.order_id.clone(),
        gross_amount: r.gross_amount,
        customer_details: r.customer_details.clone(),
        item_details: r.item_details.clone(),
        context: r.context.clone(),
        status: r.status,
        raw_transaction_status: Some(r.raw_transaction_status.clone()),
        snap_token: Some(r.snap_token.clone()),
        created_at: Utc::now(),
        updated_at: None,
    }
}

#[async_trait]
impl PaymentRecordStore for InMemoryStore {
    async fn insert(&self, record: &NewPaymentRecord) -> Result<(), StoreError> {
        self.check()?;
        let mut map = lock(&self.records);
        if map.contains_key(&record.order_id) {
            return Err(StoreError::Backend(format!(
                "duplicate order_id {}",
                record.order_id
            )));
        }
        map.insert(record.order_id.clone(), materialise(record));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        self.check()?;
        Ok(self.get(order_id))
    }

    async fn update_status(&self, order_id: &str, update: &StatusUpdate) -> Result<bool, StoreError> {
        self.check()?;
        let mut map = lock(&self.records);
        let Some(rec) = map.get_mut(order_id) else {
            return Ok(false);
        };
        rec.status = update.status;
        rec.raw_transaction_status = update.raw_transaction_status.clone();
        rec.updated_at = Some(Utc::now());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// A gateway failure to replay. Produces a fresh `GatewayError` per call.
#[derive(Clone, Debug)]
pub enum GatewayFault {
    Timeout,
    Transport,
    Rejected { status: u16, messages: Vec<String> },
    NotFound,
}

impl GatewayFault {
    fn to_error(&self, order_id: &str) -> GatewayError {
        match self {
            GatewayFault::Timeout => GatewayError::Timeout(Duration::from_secs(10)),
            GatewayFault::Transport => GatewayError::Transport("connection refused".to_string()),
            GatewayFault::Rejected { status, messages } => GatewayError::Rejected {
                status: *status,
                body: json!({ "error_messages": messages }),
            },
            GatewayFault::NotFound => GatewayError::TransactionNotFound(order_id.to_string()),
        }
    }
}

#[derive(Default)]
struct GatewayScript {
    create_fault: Option<GatewayFault>,
    status_fault: Option<GatewayFault>,
    statuses: BTreeMap<String, GatewayStatus>,
    creates: Vec<CreateTransaction>,
    status_queries: Vec<String>,
}

/// Gateway whose answers are set by the test. Orders with no scripted
/// status answer `TransactionNotFound`.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<GatewayScript>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a status answer carrying `transaction_status`.
    pub fn set_status(&self, order_id: &str, transaction_status: &str) {
        self.set_gateway_status(
            order_id,
            GatewayStatus {
                order_id: Some(order_id.to_string()),
                status_code: Some("200".to_string()),
                transaction_status: Some(transaction_status.to_string()),
                ..GatewayStatus::default()
            },
        );
    }

    pub fn set_gateway_status(&self, order_id: &str, status: GatewayStatus) {
        lock(&self.script)
            .statuses
            .insert(order_id.to_string(), status);
    }

    /// Every create call fails with `fault` (`None` restores success).
    pub fn fail_create(&self, fault: Option<GatewayFault>) {
        lock(&self.script).create_fault = fault;
    }

    /// Every status query fails with `fault` (`None` restores scripted answers).
    pub fn fail_status(&self, fault: Option<GatewayFault>) {
        lock(&self.script).status_fault = fault;
    }

    pub fn create_calls(&self) -> usize {
        lock(&self.script).creates.len()
    }

    pub fn status_calls(&self) -> usize {
        lock(&self.script).status_queries.len()
    }

    pub fn last_create(&self) -> Option<CreateTransaction> {
        lock(&self.script).creates.last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_transaction(
        &self,
        req: &CreateTransaction,
    ) -> Result<TransactionToken, GatewayError> {
        let mut s = lock(&self.script);
        s.creates.push(req.clone());
        if let Some(fault) = &s.create_fault {
            return Err(fault.to_error(&req.order_id));
        }
        Ok(TransactionToken {
            token: format!("snap-{}", req.order_id),
            redirect_url: format!("https://app.sandbox.midtrans.com/snap/v2/vtweb/snap-{}", req.order_id),
        })
    }

    async fn query_status(&self, order_id: &str) -> Result<GatewayStatus, GatewayError> {
        let mut s = lock(&self.script);
        s.status_queries.push(order_id.to_string());
        if let Some(fault) = &s.status_fault {
            return Err(fault.to_error(order_id));
        }
        s.statuses
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::TransactionNotFound(order_id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, msg: &EmailMessage) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Rejected {
                status: 422,
                body: json!({ "message": "recipient rejected" }),
            });
        }
        lock(&self.sent).push(msg.clone());
        Ok(())
    }
}
