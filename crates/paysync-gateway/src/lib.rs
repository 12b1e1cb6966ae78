//! Midtrans adapter for [`paysync_reconcile::PaymentGateway`].
//!
//! - create: `POST {snap}/snap/v1/transactions`
//! - status: `GET {api}/v2/{order_id}/status`
//!
//! Both use HTTP Basic auth with the server key as user and an empty
//! password, and are bounded by per-call timeouts.

mod client;
mod wire;

pub use client::{MidtransClient, MidtransEndpoints};
