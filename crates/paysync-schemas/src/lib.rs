//! Shared data model for paysync.
//!
//! Plain `Serialize + Deserialize` types passed between the reconcile
//! engine, the gateway/store adapters and the HTTP surface. No IO and no
//! status semantics live here: the raw-status table is owned by
//! `paysync-reconcile::map_status`.

pub mod lenient;

mod gateway;
mod payment;
mod status;

pub use gateway::{CreateTransaction, GatewayStatus, TransactionToken};
pub use payment::{
    CustomerDetails, DestinationContext, EventContext, ItemDetail, NewPaymentRecord,
    PaymentContext, PaymentRecord, StatusUpdate,
};
pub use status::{CanonicalStatus, StatusInfo};
