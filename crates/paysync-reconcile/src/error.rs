//! Error taxonomy for reconciliation.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Failure talking to the payment processor.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway not configured: {0}")]
    NotConfigured(String),

    #[error("payment gateway timed out after {0:?}")]
    Timeout(Duration),

    #[error("payment gateway unreachable: {0}")]
    Transport(String),

    /// Non-2xx answer. `body` is the processor's raw error payload.
    #[error("payment gateway rejected request (http {status})")]
    Rejected { status: u16, body: Value },

    #[error("transaction {0} not found at payment gateway")]
    TransactionNotFound(String),

    #[error("unexpected payment gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Diagnostic detail for callers: the processor's `error_messages` when
    /// it sent any, otherwise the raw body or the error text.
    pub fn detail(&self) -> Value {
        match self {
            GatewayError::Rejected { body, .. } => body
                .get("error_messages")
                .cloned()
                .unwrap_or_else(|| body.clone()),
            other => Value::String(other.to_string()),
        }
    }
}

/// Failure talking to the record store. Never fatal to a request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store backend error: {0}")]
    Backend(String),

    #[error("record store returned a malformed record: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Malformed or missing request fields.
    #[error("{0}")]
    Validation(String),

    /// Webhook signature mismatch.
    #[error("invalid signature for order {order_id}")]
    Authentication { order_id: String },

    /// Neither the gateway nor the store knows the order.
    #[error("payment not found: {order_id}")]
    NotFound { order_id: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_prefers_error_messages() {
        let e = GatewayError::Rejected {
            status: 400,
            body: json!({"error_messages": ["transaction_details.gross_amount is required"]}),
        };
        assert_eq!(e.detail(), json!(["transaction_details.gross_amount is required"]));

        let e = GatewayError::Rejected {
            status: 502,
            body: json!({"message": "bad gateway"}),
        };
        assert_eq!(e.detail(), json!({"message": "bad gateway"}));
    }

    #[test]
    fn detail_falls_back_to_message() {
        let e = GatewayError::Transport("connection refused".into());
        assert_eq!(
            e.detail(),
            json!("payment gateway unreachable: connection refused")
        );
    }
}
