use std::time::Duration;

use async_trait::async_trait;
use paysync_config::GatewayMode;
use paysync_reconcile::{GatewayError, PaymentGateway};
use paysync_schemas::{CreateTransaction, GatewayStatus, TransactionToken};
use serde_json::Value;
use tracing::debug;

use crate::wire::{SnapRequest, SnapResponse};

/// Base URLs for the two Midtrans APIs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidtransEndpoints {
    /// Snap (checkout) API root.
    pub snap_base: String,
    /// Core API root (status queries).
    pub api_base: String,
}

impl MidtransEndpoints {
    pub fn for_mode(mode: GatewayMode) -> Self {
        if mode.is_production() {
            Self {
                snap_base: "https://app.midtrans.com".to_string(),
                api_base: "https://api.midtrans.com".to_string(),
            }
        } else {
            Self {
                snap_base: "https://app.sandbox.midtrans.com".to_string(),
                api_base: "https://api.sandbox.midtrans.com".to_string(),
            }
        }
    }

    /// Both APIs on one root; used against mock servers.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            snap_base: base.clone(),
            api_base: base,
        }
    }
}

#[derive(Clone)]
pub struct MidtransClient {
    http: reqwest::Client,
    server_key: String,
    endpoints: MidtransEndpoints,
    create_timeout: Duration,
    status_timeout: Duration,
}

impl std::fmt::Debug for MidtransClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidtransClient")
            .field("server_key", &"<REDACTED>")
            .field("endpoints", &self.endpoints)
            .field("create_timeout", &self.create_timeout)
            .field("status_timeout", &self.status_timeout)
            .finish()
    }
}

impl MidtransClient {
    pub fn new(
        server_key: impl Into<String>,
        endpoints: MidtransEndpoints,
        create_timeout: Duration,
        status_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let server_key = server_key.into();
        if server_key.trim().is_empty() {
            return Err(GatewayError::NotConfigured(
                "server key is empty".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("paysync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::NotConfigured(e.to_string()))?;
        Ok(Self {
            http,
            server_key,
            endpoints,
            create_timeout,
            status_timeout,
        })
    }

    pub fn endpoints(&self) -> &MidtransEndpoints {
        &self.endpoints
    }

    fn url(base: &str, path: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for MidtransClient {
    async fn create_transaction(
        &self,
        req: &CreateTransaction,
    ) -> Result<TransactionToken, GatewayError> {
        let url = Self::url(&self.endpoints.snap_base, "/snap/v1/transactions");
        debug!(order_id = %req.order_id, %url, "snap create");

        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.server_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&SnapRequest::from_create(req))
            .timeout(self.create_timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, self.create_timeout))?;

        let body = read_json(resp, self.create_timeout).await?;
        let snap: SnapResponse = serde_json::from_value(body)
            .map_err(|e| GatewayError::Decode(format!("snap response: {e}")))?;
        Ok(TransactionToken {
            token: snap.token,
            redirect_url: snap.redirect_url,
        })
    }

    async fn query_status(&self, order_id: &str) -> Result<GatewayStatus, GatewayError> {
        let url = Self::url(&self.endpoints.api_base, &format!("/v2/{order_id}/status"));
        debug!(order_id, %url, "status query");

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.server_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.status_timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, self.status_timeout))?;

        let body = read_json(resp, self.status_timeout).await?;
        let status: GatewayStatus = serde_json::from_value(body)
            .map_err(|e| GatewayError::Decode(format!("status response: {e}")))?;

        // The Core API answers unknown orders with HTTP 200 and a 404 in the body.
        if status.status_code.as_deref() == Some("404") {
            return Err(GatewayError::TransactionNotFound(order_id.to_string()));
        }
        if status.transaction_status.is_none() {
            return Err(GatewayError::Decode(
                "status response has no transaction_status".to_string(),
            ));
        }
        Ok(status)
    }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout(timeout)
    } else {
        GatewayError::Transport(e.to_string())
    }
}

/// 2xx => parsed JSON body. Anything else => `Rejected` carrying the body
/// (JSON if it parses, otherwise `{"raw": text}`).
async fn read_json(resp: reqwest::Response, timeout: Duration) -> Result<Value, GatewayError> {
    let status = resp.status();
    let text = resp.text().await.map_err(|e| transport_error(e, timeout))?;
    let parsed = serde_json::from_str::<Value>(&text);

    if !status.is_success() {
        let body = parsed.unwrap_or_else(|_| serde_json::json!({ "raw": text }));
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    parsed.map_err(|e| GatewayError::Decode(format!("non-JSON 2xx body: {e}")))
}
