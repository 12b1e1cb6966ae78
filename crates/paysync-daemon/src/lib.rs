//! HTTP surface of the payment proxy.
//!
//! The binary in `main.rs` wires real adapters into [`state::AppState`];
//! integration tests build the same router over testkit fakes.

pub mod api_types;
pub mod routes;
pub mod state;
