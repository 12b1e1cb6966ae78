use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::payment::{CustomerDetails, ItemDetail};

/// Input to the processor's create-transaction call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub order_id: String,
    pub gross_amount: i64,
    pub customer_details: CustomerDetails,
    pub item_details: Vec<ItemDetail>,
    /// Where the processor sends the payer after checkout.
    pub finish_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionToken {
    pub token: String,
    pub redirect_url: String,
}

/// The processor's view of one transaction, from a status query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStatus {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub status_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub transaction_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub fraud_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub gross_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub transaction_time: Option<String>,
}
