//! In-process fakes for the reconcile seams, plus request builders.
//!
//! Every fake is a cheap `Clone` handle over shared state, so a test can
//! hand one copy to the engine and keep another for assertions.

mod fakes;

pub use fakes::{GatewayFault, InMemoryStore, RecordingMailer, ScriptedGateway};

use paysync_reconcile::{signature_digest, CreatePaymentRequest, WebhookNotification};
use paysync_schemas::{CustomerDetails, ItemDetail};
use serde_json::{json, Map};

/// Server key used by scenario tests.
pub const TEST_SERVER_KEY: &str = "SB-Mid-server-testkit";

/// A well-formed single-item create request.
pub fn create_request(order_id: &str, gross_amount: i64) -> CreatePaymentRequest {
    CreatePaymentRequest {
        order_id: Some(order_id.to_string()),
        gross_amount: Some(gross_amount),
        customer_details: Some(customer("Rina", "rina@example.com")),
        item_details: Some(vec![ItemDetail {
            id: Some("ITEM-1".to_string()),
            price: gross_amount,
            quantity: 1,
            name: Some("Ticket".to_string()),
            extra: Map::new(),
        }]),
        payment_type: None,
    }
}

/// Event-tagged create request; the customer carries the event identifiers.
pub fn event_create_request(order_id: &str, gross_amount: i64, event_id: &str) -> CreatePaymentRequest {
    let mut req = create_request(order_id, gross_amount);
    let mut c = customer("Rina", "rina@example.com");
    c.extra.insert("userId".into(), json!("user-1"));
    c.extra.insert("eventId".into(), json!(event_id));
    c.extra.insert("eventName".into(), json!("Jazz Night"));
    req.customer_details = Some(c);
    req.payment_type = Some("event".to_string());
    req
}

pub fn customer(first_name: &str, email: &str) -> CustomerDetails {
    CustomerDetails {
        first_name: Some(first_name.to_string()),
        email: Some(email.to_string()),
        phone: Some("081234567890".to_string()),
        extra: Map::new(),
    }
}

/// A webhook push signed with `key` over exactly the given text fields.
pub fn signed_webhook(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    transaction_status: &str,
    key: &str,
) -> WebhookNotification {
    WebhookNotification {
        order_id: Some(order_id.to_string()),
        status_code: Some(status_code.to_string()),
        gross_amount: Some(gross_amount.to_string()),
        signature_key: Some(signature_digest(order_id, status_code, gross_amount, key)),
        transaction_status: Some(transaction_status.to_string()),
    }
}
