use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;
use crate::status::{CanonicalStatus, StatusInfo};

/// Customer block as sent by the client app.
///
/// Only the three fields the processor needs are typed; everything else
/// (user/event/destination identifiers, …) is carried in `extra` verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_text")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_text")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_text")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomerDetails {
    fn extra_text(&self, key: &str) -> Option<String> {
        self.extra.get(key).and_then(lenient::value_as_text)
    }

    fn extra_value(&self, key: &str) -> Option<Value> {
        self.extra.get(key).filter(|v| !v.is_null()).cloned()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub price: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_text")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub user_id: Option<String>,
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub event_data: Option<Value>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub quantity: i64,
    pub total_amount: i64,
    pub is_free: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DestinationContext {
    pub user_id: Option<String>,
    pub destinasi_id: Option<String>,
    pub destinasi_name: Option<String>,
    pub destinasi_data: Option<Value>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub quantity: i64,
    pub total_amount: i64,
    pub is_free: bool,
}

/// Domain tag attached to a payment record. Pass-through only: nothing in
/// reconciliation reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payment_type", rename_all = "snake_case")]
pub enum PaymentContext {
    General,
    Event(EventContext),
    Destination(DestinationContext),
}

impl PaymentContext {
    /// Build the tag from the request's `payment_type` and the customer
    /// block. Missing or unrecognised types are `General`.
    pub fn from_request(
        payment_type: Option<&str>,
        customer: &CustomerDetails,
        items: &[ItemDetail],
        gross_amount: i64,
    ) -> Self {
        let quantity = items.first().map(|i| i.quantity).unwrap_or(1);
        let is_free = gross_amount == 0;
        match payment_type.map(str::trim) {
            Some("event") => PaymentContext::Event(EventContext {
                user_id: customer.extra_text("userId"),
                event_id: customer.extra_text("eventId"),
                event_name: customer.extra_text("eventName"),
                event_data: customer.extra_value("eventData"),
                user_email: customer.email.clone(),
                user_name: customer.first_name.clone(),
                quantity,
                total_amount: gross_amount,
                is_free,
            }),
            Some("destination") => PaymentContext::Destination(DestinationContext {
                user_id: customer.extra_text("userId"),
                destinasi_id: customer.extra_text("destinasiId"),
                destinasi_name: customer.extra_text("destinasiName"),
                destinasi_data: customer.extra_value("destinasiData"),
                user_email: customer.email.clone(),
                user_name: customer.first_name.clone(),
                quantity,
                total_amount: gross_amount,
                is_free,
            }),
            _ => PaymentContext::General,
        }
    }

    pub fn payment_type(&self) -> &'static str {
        match self {
            PaymentContext::General => "general",
            PaymentContext::Event(_) => "event",
            PaymentContext::Destination(_) => "destination",
        }
    }
}

/// A record as it is first written, at token generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewPaymentRecord {
    pub order_id: String,
    pub gross_amount: i64,
    pub customer_details: CustomerDetails,
    pub item_details: Vec<ItemDetail>,
    pub context: PaymentContext,
    pub status: CanonicalStatus,
    pub raw_transaction_status: String,
    pub snap_token: String,
}

/// One payment attempt as held by the record store.
///
/// `is_paid` / `can_navigate_home` are not stored fields here; they are
/// always derived from `status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    pub gross_amount: i64,
    pub customer_details: CustomerDetails,
    pub item_details: Vec<ItemDetail>,
    pub context: PaymentContext,
    pub status: CanonicalStatus,
    pub raw_transaction_status: Option<String>,
    pub snap_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn status_info(&self) -> StatusInfo {
        StatusInfo::for_status(self.status)
    }

    pub fn is_paid(&self) -> bool {
        self.status_info().is_paid()
    }

    pub fn can_navigate_home(&self) -> bool {
        self.status_info().can_navigate_home()
    }
}

/// Status mutation applied by any of the three reconciliation triggers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: CanonicalStatus,
    /// Replaces the stored raw status, `None` included, so `status` always
    /// equals the mapping of the raw value.
    pub raw_transaction_status: Option<String>,
}

impl StatusUpdate {
    pub fn is_paid(&self) -> bool {
        StatusInfo::for_status(self.status).is_paid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customer() -> CustomerDetails {
        serde_json::from_value(json!({
            "first_name": "Ayu",
            "email": "ayu@example.com",
            "userId": 42,
            "eventId": "EV-1",
            "eventName": "Jazz Night",
            "eventData": {"venue": "hall"},
            "destinasiId": "D-9"
        }))
        .unwrap()
    }

    fn items(qty: i64) -> Vec<ItemDetail> {
        vec![ItemDetail {
            id: Some("T1".into()),
            price: 5000,
            quantity: qty,
            name: Some("Ticket".into()),
            extra: Map::new(),
        }]
    }

    #[test]
    fn event_context_pulls_identifiers_from_customer() {
        let ctx = PaymentContext::from_request(Some("event"), &customer(), &items(3), 15000);
        let PaymentContext::Event(ev) = ctx else {
            panic!("expected event context");
        };
        assert_eq!(ev.user_id.as_deref(), Some("42"));
        assert_eq!(ev.event_id.as_deref(), Some("EV-1"));
        assert_eq!(ev.event_data, Some(json!({"venue": "hall"})));
        assert_eq!(ev.user_name.as_deref(), Some("Ayu"));
        assert_eq!(ev.quantity, 3);
        assert!(!ev.is_free);
    }

    #[test]
    fn destination_context_free_when_zero_amount() {
        let ctx = PaymentContext::from_request(Some("destination"), &customer(), &[], 0);
        let PaymentContext::Destination(d) = ctx else {
            panic!("expected destination context");
        };
        assert_eq!(d.destinasi_id.as_deref(), Some("D-9"));
        assert_eq!(d.quantity, 1);
        assert!(d.is_free);
    }

    #[test]
    fn unrecognised_payment_type_is_general() {
        let c = customer();
        assert_eq!(
            PaymentContext::from_request(None, &c, &[], 1),
            PaymentContext::General
        );
        assert_eq!(
            PaymentContext::from_request(Some("subscription"), &c, &[], 1),
            PaymentContext::General
        );
    }

    #[test]
    fn item_detail_accepts_numeric_strings() {
        let item: ItemDetail =
            serde_json::from_value(json!({"id": 7, "price": "2500", "quantity": "2", "name": "Tea"}))
                .unwrap();
        assert_eq!(item.id.as_deref(), Some("7"));
        assert_eq!(item.price, 2500);
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn context_serialises_with_payment_type_tag() {
        let v = serde_json::to_value(PaymentContext::General).unwrap();
        assert_eq!(v, json!({"payment_type": "general"}));
    }
}
