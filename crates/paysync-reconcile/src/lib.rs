//! paysync-reconcile
//!
//! Payment status reconciliation core:
//! - raw processor status => canonical `{status, is_paid, can_navigate_home}`
//! - webhook authenticity via SHA-512 keyed digest
//! - one engine with three triggers (create, webhook push, poll) keeping the
//!   record store in line with the processor
//!
//! The processor and the record store are reached only through the
//! [`PaymentGateway`] and [`PaymentRecordStore`] traits; adapters live in
//! `paysync-gateway` and `paysync-db`.

mod engine;
mod error;
mod gateway;
mod signature;
mod status;
mod store;
mod validate;

pub use engine::{
    CreatePaymentRequest, CreatedPayment, PollOutcome, PollSource, ReconciliationEngine,
    StatusSource, WebhookNotification, WebhookOutcome,
};
pub use error::{GatewayError, ReconcileError, StoreError};
pub use gateway::PaymentGateway;
pub use signature::{signature_digest, verify_signature};
pub use status::{canonical_status, map_status};
pub use store::{PaymentRecordStore, RecordStore};
pub use validate::{is_valid_order_id, validate_order_id};
