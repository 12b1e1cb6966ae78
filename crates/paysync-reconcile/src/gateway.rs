use async_trait::async_trait;
use paysync_schemas::{CreateTransaction, GatewayStatus, TransactionToken};

use crate::error::GatewayError;

/// Outbound calls to the payment processor.
///
/// # Contract
/// - Both calls are bounded by a timeout; a timed-out call is a
///   `GatewayError`, never a hang.
/// - No local state is mutated.
/// - A `query_status` failure means "status unknown from gateway", not
///   "payment failed".
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_transaction(
        &self,
        req: &CreateTransaction,
    ) -> Result<TransactionToken, GatewayError>;

    async fn query_status(&self, order_id: &str) -> Result<GatewayStatus, GatewayError>;
}
