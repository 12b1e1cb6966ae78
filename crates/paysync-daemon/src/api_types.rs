//! Request and response bodies for the paysync-daemon HTTP endpoints.
//!
//! No business logic lives here. Field names are the wire contract the
//! checkout frontend already consumes.

use chrono::{DateTime, Utc};
use paysync_schemas::{lenient, CanonicalStatus, GatewayStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Failure body for every route. Optional fields appear only where the
/// route's contract includes them.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
            order_id: None,
            redirect: None,
        }
    }

    pub fn with_error(mut self, error: Value) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_redirect(mut self, redirect: &'static str) -> Self {
        self.redirect = Some(redirect);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Gateway-side fields echoed on polls, present only when the gateway
/// answered during the poll.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GatewayDiagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraud_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_time: Option<String>,
}

impl From<GatewayStatus> for GatewayDiagnostics {
    fn from(gs: GatewayStatus) -> Self {
        Self {
            fraud_status: gs.fraud_status,
            payment_type: gs.payment_type,
            gross_amount: gs.gross_amount,
            transaction_time: gs.transaction_time,
        }
    }
}

// ---------------------------------------------------------------------------
// POST /generate-snap-token
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SnapTokenResponse {
    pub success: bool,
    pub snap_token: String,
    pub redirect_url: String,
    pub order_id: String,
}

// ---------------------------------------------------------------------------
// POST /midtrans-webhook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: &'static str,
    pub order_id: String,
    pub status: CanonicalStatus,
}

// ---------------------------------------------------------------------------
// GET /payment-finish
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinishQuery {
    pub order_id: Option<String>,
    pub status_code: Option<String>,
    pub transaction_status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishResponse {
    /// Equals `is_paid`.
    pub success: bool,
    pub message: String,
    pub order_id: String,
    pub status: CanonicalStatus,
    pub is_paid: bool,
    pub can_navigate_home: bool,
    pub transaction_status: String,
    pub redirect: &'static str,
    #[serde(flatten)]
    pub gateway: Option<GatewayDiagnostics>,
}

// ---------------------------------------------------------------------------
// GET /payment-status/:order_id
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusResponse {
    pub success: bool,
    pub order_id: String,
    pub status: CanonicalStatus,
    pub is_paid: bool,
    pub can_navigate_home: bool,
    pub transaction_status: Option<String>,
    pub message: String,
    pub firebase_update_success: bool,
    #[serde(flatten)]
    pub gateway: Option<GatewayDiagnostics>,
}

// ---------------------------------------------------------------------------
// POST /reset, POST /reset-password
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailRequest {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub html: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /  GET /health  fallback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub firebase_enabled: bool,
    pub environment: String,
    pub endpoints: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub firebase_enabled: bool,
    pub timestamp: DateTime<Utc>,
    /// Seconds since boot.
    pub uptime: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointNotFoundResponse {
    pub success: bool,
    pub message: &'static str,
    pub path: String,
    pub method: String,
}
