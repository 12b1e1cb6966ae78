//! Reconciliation engine: one state machine per order, three triggers.
//!
//! # Ordering rules
//! - Webhooks: signature verification precedes any use of the payload.
//! - Polls: a live gateway answer always wins over the stored record; the
//!   store is a cache of gateway truth.
//! - Store failures are logged and swallowed. They never fail a request.
//!
//! No cross-request locking. Two triggers racing on the same order both
//! read-then-write; last write wins.

use std::sync::Arc;

use paysync_schemas::{
    lenient, CanonicalStatus, CreateTransaction, CustomerDetails, GatewayStatus, ItemDetail,
    NewPaymentRecord, PaymentContext, PaymentRecord, StatusInfo, StatusUpdate,
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::{ReconcileError, StoreError};
use crate::gateway::PaymentGateway;
use crate::signature::verify_signature;
use crate::status::map_status;
use crate::store::RecordStore;
use crate::validate::validate_order_id;

const MISSING_CREATE_FIELDS: &str =
    "Missing required fields: order_id, gross_amount, customer_details, item_details";
const MISSING_WEBHOOK_FIELDS: &str = "Missing required webhook fields";
const MISSING_ORDER_ID: &str = "Order ID is required";

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Body of a create-transaction request. Every field is optional at the
/// type level so missing fields surface as a validation error, not a
/// decode failure.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub gross_amount: Option<i64>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub item_details: Option<Vec<ItemDetail>>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub payment_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedPayment {
    pub order_id: String,
    pub snap_token: String,
    pub redirect_url: String,
    pub record_persisted: bool,
}

/// Webhook push from the processor. `status_code` and `gross_amount` keep
/// the exact text received, since the signature is computed over it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookNotification {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub status_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub gross_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub signature_key: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub transaction_status: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WebhookOutcome {
    pub order_id: String,
    pub info: StatusInfo,
    pub record_updated: bool,
}

/// Who asked for a poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollSource {
    /// Payer returned from checkout. `status_hint` is the client-reported
    /// status; it is only used when nothing authoritative answered and is
    /// never persisted.
    Redirect { status_hint: Option<String> },
    /// Explicit status check.
    Explicit,
}

/// Where the answer of a poll came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusSource {
    Gateway,
    Store,
    ClientHint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollOutcome {
    pub order_id: String,
    pub info: StatusInfo,
    pub transaction_status: Option<String>,
    pub source: StatusSource,
    /// Present only when the gateway answered in this poll.
    pub gateway: Option<GatewayStatus>,
    pub store_updated: bool,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ReconciliationEngine {
    gateway: Arc<dyn PaymentGateway>,
    store: RecordStore,
    signature_key: String,
    finish_base_url: Option<String>,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("store", &self.store)
            .field("signature_key", &"<REDACTED>")
            .field("finish_base_url", &self.finish_base_url)
            .finish()
    }
}

impl ReconciliationEngine {
    /// `signature_key` is the processor server key that webhooks are
    /// signed with.
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: RecordStore,
        signature_key: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            store,
            signature_key: signature_key.into(),
            finish_base_url: None,
        }
    }

    /// Base URL for the post-checkout callback
    /// (`{base}/payment-finish?order_id={order_id}`).
    pub fn with_finish_base_url(mut self, base: impl Into<String>) -> Self {
        self.finish_base_url = Some(base.into());
        self
    }

    pub fn store_enabled(&self) -> bool {
        self.store.is_enabled()
    }

    // -----------------------------------------------------------------------
    // a. create
    // -----------------------------------------------------------------------

    /// Validate, create the transaction at the gateway, then persist a
    /// pending record. Nothing is persisted if the gateway call fails.
    pub async fn on_create(&self, req: CreatePaymentRequest) -> Result<CreatedPayment, ReconcileError> {
        let (Some(order_id), Some(gross_amount), Some(customer), Some(items)) = (
            req.order_id,
            req.gross_amount,
            req.customer_details,
            req.item_details,
        ) else {
            return Err(ReconcileError::Validation(MISSING_CREATE_FIELDS.to_string()));
        };

        validate_order_id(&order_id)?;
        if gross_amount < 0 {
            return Err(ReconcileError::Validation(
                "gross_amount must be a non-negative integer".to_string(),
            ));
        }

        let tx = CreateTransaction {
            order_id: order_id.clone(),
            gross_amount,
            customer_details: customer,
            item_details: items,
            finish_url: self.finish_url(&order_id),
        };

        let token = self.gateway.create_transaction(&tx).await.map_err(|e| {
            error!(order_id = %order_id, error = %e, detail = %e.detail(), "create transaction failed");
            ReconcileError::Gateway(e)
        })?;

        let initial = map_status(Some("pending"));
        let context = PaymentContext::from_request(
            req.payment_type.as_deref(),
            &tx.customer_details,
            &tx.item_details,
            gross_amount,
        );
        let record = NewPaymentRecord {
            order_id: order_id.clone(),
            gross_amount,
            customer_details: tx.customer_details,
            item_details: tx.item_details,
            context,
            status: initial.status(),
            raw_transaction_status: "pending".to_string(),
            snap_token: token.token.clone(),
        };
        let record_persisted = self.persist(&record).await;

        info!(
            order_id = %order_id,
            payment_type = record.context.payment_type(),
            record_persisted,
            "transaction created"
        );

        Ok(CreatedPayment {
            order_id,
            snap_token: token.token,
            redirect_url: token.redirect_url,
            record_persisted,
        })
    }

    // -----------------------------------------------------------------------
    // b. webhook
    // -----------------------------------------------------------------------

    /// Verify, map, and apply a webhook push. An unknown order is logged
    /// and dropped, not an error.
    pub async fn on_webhook(&self, n: WebhookNotification) -> Result<WebhookOutcome, ReconcileError> {
        let (Some(order_id), Some(status_code), Some(gross_amount), Some(signature)) =
            (n.order_id, n.status_code, n.gross_amount, n.signature_key)
        else {
            return Err(ReconcileError::Validation(MISSING_WEBHOOK_FIELDS.to_string()));
        };

        if !verify_signature(
            &order_id,
            &status_code,
            &gross_amount,
            &signature,
            &self.signature_key,
        ) {
            error!(order_id = %order_id, "invalid webhook signature");
            return Err(ReconcileError::Authentication { order_id });
        }

        let raw = n.transaction_status;
        let info = map_status(raw.as_deref());
        info!(
            order_id = %order_id,
            transaction_status = raw.as_deref().unwrap_or("<none>"),
            status = %info.status(),
            "webhook received"
        );

        let record_updated = self.apply(&order_id, info.status(), raw).await;
        if !record_updated {
            info!(
                order_id = %order_id,
                store_enabled = self.store.is_enabled(),
                "webhook not applied to a stored record; dropped"
            );
        }

        Ok(WebhookOutcome {
            order_id,
            info,
            record_updated,
        })
    }

    // -----------------------------------------------------------------------
    // c. poll
    // -----------------------------------------------------------------------

    /// Ask the gateway first; fall back to the stored record, then (redirect
    /// only) to the client hint. `NotFound` when nothing answers.
    pub async fn on_poll(&self, order_id: &str, source: PollSource) -> Result<PollOutcome, ReconcileError> {
        if order_id.trim().is_empty() {
            return Err(ReconcileError::Validation(MISSING_ORDER_ID.to_string()));
        }
        // The id ends up in the gateway URL path.
        validate_order_id(order_id)?;

        let live = match self.gateway.query_status(order_id).await {
            Ok(gs) if gs.transaction_status.is_some() => Some(gs),
            Ok(_) => {
                warn!(order_id, "gateway status without transaction_status; ignoring");
                None
            }
            Err(e) => {
                warn!(order_id, error = %e, "gateway status unavailable; falling back");
                None
            }
        };

        if let Some(gs) = live {
            let raw = gs.transaction_status.clone();
            let info = map_status(raw.as_deref());
            info!(
                order_id,
                transaction_status = raw.as_deref().unwrap_or("<none>"),
                status = %info.status(),
                "gateway status"
            );
            let store_updated = self.apply(order_id, info.status(), raw.clone()).await;
            return Ok(PollOutcome {
                order_id: order_id.to_string(),
                info,
                transaction_status: raw,
                source: StatusSource::Gateway,
                gateway: Some(gs),
                store_updated,
            });
        }

        if let Some(record) = self.lookup(order_id).await {
            // Recomputed from the raw status; the stored canonical status is
            // never trusted on its own.
            let info = map_status(record.raw_transaction_status.as_deref());
            debug!(order_id, status = %info.status(), "served from stored record");
            return Ok(PollOutcome {
                order_id: order_id.to_string(),
                info,
                transaction_status: record.raw_transaction_status,
                source: StatusSource::Store,
                gateway: None,
                store_updated: false,
            });
        }

        if let PollSource::Redirect {
            status_hint: Some(hint),
        } = source
        {
            let info = map_status(Some(&hint));
            debug!(order_id, transaction_status = %hint, "served from client hint");
            return Ok(PollOutcome {
                order_id: order_id.to_string(),
                info,
                transaction_status: Some(hint),
                source: StatusSource::ClientHint,
                gateway: None,
                store_updated: false,
            });
        }

        info!(order_id, "payment not found in gateway or store");
        Err(ReconcileError::NotFound {
            order_id: order_id.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Store helpers: every failure is logged and swallowed.
    // -----------------------------------------------------------------------

    fn finish_url(&self, order_id: &str) -> Option<String> {
        self.finish_base_url.as_ref().map(|base| {
            format!(
                "{}/payment-finish?order_id={}",
                base.trim_end_matches('/'),
                order_id
            )
        })
    }

    async fn persist(&self, record: &NewPaymentRecord) -> bool {
        let RecordStore::Connected(store) = &self.store else {
            return false;
        };
        match store.insert(record).await {
            Ok(()) => true,
            Err(e) => {
                log_store_error(&record.order_id, "insert", &e);
                false
            }
        }
    }

    async fn lookup(&self, order_id: &str) -> Option<PaymentRecord> {
        let RecordStore::Connected(store) = &self.store else {
            return None;
        };
        match store.find_by_order_id(order_id).await {
            Ok(found) => found,
            Err(e) => {
                log_store_error(order_id, "lookup", &e);
                None
            }
        }
    }

    async fn apply(&self, order_id: &str, status: CanonicalStatus, raw: Option<String>) -> bool {
        let RecordStore::Connected(store) = &self.store else {
            return false;
        };
        let update = StatusUpdate {
            status,
            raw_transaction_status: raw,
        };
        match store.update_status(order_id, &update).await {
            Ok(updated) => {
                if updated {
                    info!(order_id, status = %status, is_paid = update.is_paid(), "record updated");
                }
                updated
            }
            Err(e) => {
                log_store_error(order_id, "update", &e);
                false
            }
        }
    }
}

fn log_store_error(order_id: &str, op: &str, e: &StoreError) {
    error!(order_id, op, error = %e, "record store operation failed; continuing");
}
