//! Midtrans request/response bodies.

use paysync_schemas::{CreateTransaction, CustomerDetails, ItemDetail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct SnapRequest<'a> {
    pub transaction_details: TransactionDetails<'a>,
    pub customer_details: SnapCustomer<'a>,
    pub item_details: Vec<SnapItem<'a>>,
    pub credit_card: CreditCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<Callbacks<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransactionDetails<'a> {
    pub order_id: &'a str,
    pub gross_amount: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SnapCustomer<'a> {
    pub first_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SnapItem<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub price: i64,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreditCard {
    pub secure: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct Callbacks<'a> {
    pub finish: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapResponse {
    pub token: String,
    pub redirect_url: String,
}

impl<'a> SnapRequest<'a> {
    pub fn from_create(tx: &'a CreateTransaction) -> Self {
        Self {
            transaction_details: TransactionDetails {
                order_id: &tx.order_id,
                gross_amount: tx.gross_amount,
            },
            customer_details: SnapCustomer::from_details(&tx.customer_details),
            item_details: tx.item_details.iter().map(SnapItem::from_detail).collect(),
            credit_card: CreditCard { secure: true },
            callbacks: tx.finish_url.as_deref().map(|finish| Callbacks { finish }),
        }
    }
}

impl<'a> SnapCustomer<'a> {
    fn from_details(c: &'a CustomerDetails) -> Self {
        Self {
            first_name: c.first_name.as_deref().unwrap_or("Customer"),
            email: c.email.as_deref().unwrap_or(""),
            phone: c.phone.as_deref().unwrap_or(""),
        }
    }
}

impl<'a> SnapItem<'a> {
    fn from_detail(i: &'a ItemDetail) -> Self {
        Self {
            id: i.id.as_deref(),
            price: i.price,
            quantity: i.quantity,
            name: i.name.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn snap_body_fills_customer_defaults_and_drops_extras() {
        let tx = CreateTransaction {
            order_id: "ORDER-7".into(),
            gross_amount: 20000,
            customer_details: CustomerDetails {
                first_name: None,
                email: Some("a@b.c".into()),
                phone: None,
                extra: serde_json::from_value(json!({"userId": "u1"})).unwrap(),
            },
            item_details: vec![ItemDetail {
                id: Some("SKU-1".into()),
                price: 10000,
                quantity: 2,
                name: Some("Tiket".into()),
                extra: Map::new(),
            }],
            finish_url: Some("https://app.example/payment-finish?order_id=ORDER-7".into()),
        };
        let body = serde_json::to_value(SnapRequest::from_create(&tx)).unwrap();
        assert_eq!(
            body,
            json!({
                "transaction_details": {"order_id": "ORDER-7", "gross_amount": 20000},
                "customer_details": {"first_name": "Customer", "email": "a@b.c", "phone": ""},
                "item_details": [{"id": "SKU-1", "price": 10000, "quantity": 2, "name": "Tiket"}],
                "credit_card": {"secure": true},
                "callbacks": {"finish": "https://app.example/payment-finish?order_id=ORDER-7"}
            })
        );
    }
}
