//! Axum router and all HTTP handlers for paysync-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers only decode, call the engine, and shape the
//! response; no reconciliation decisions are made here.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use chrono::Utc;
use paysync_mail::EmailMessage;
use paysync_reconcile::{
    CreatePaymentRequest, PollSource, ReconcileError, WebhookNotification,
};
use paysync_schemas::CanonicalStatus;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

use crate::{
    api_types::{
        EmailRequest, EndpointNotFoundResponse, ErrorResponse, FinishQuery, FinishResponse,
        GatewayDiagnostics, HealthResponse, InfoResponse, MessageResponse,
        PaymentStatusResponse, SnapTokenResponse, WebhookResponse,
    },
    state::AppState,
};

const ENDPOINTS: &[&str] = &[
    "POST /reset - Send OTP email",
    "POST /generate-snap-token - Create payment",
    "POST /midtrans-webhook - Payment webhook",
    "GET /payment-finish - Payment redirect",
    "GET /payment-status/:orderId - Check status",
    "GET /health - Health check",
];

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", with_preflight(get(info)))
        .route("/health", with_preflight(get(health)))
        .route("/generate-snap-token", with_preflight(post(generate_snap_token)))
        .route("/midtrans-webhook", with_preflight(post(midtrans_webhook)))
        .route("/payment-finish", with_preflight(get(payment_finish)))
        .route("/payment-status/", with_preflight(get(payment_status_missing_id)))
        .route("/payment-status/:order_id", with_preflight(get(payment_status)))
        .route("/reset", with_preflight(post(send_email)))
        .route("/reset-password", with_preflight(post(send_email)))
        .fallback(endpoint_not_found)
        .with_state(state)
}

/// CORS policy: the configured origins, or any origin when none are set.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(std::time::Duration::from_secs(86400))
}

/// Bare `OPTIONS` (no CORS request headers) answers 200 with no body.
fn with_preflight(route: MethodRouter<Arc<AppState>>) -> MethodRouter<Arc<AppState>> {
    route.options(|| async { StatusCode::OK })
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn reply<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    reply(StatusCode::BAD_REQUEST, ErrorResponse::new(message))
}

/// Decode a JSON body into an engine request. Any decode failure is a 400.
fn decode_body<T: DeserializeOwned>(body: Result<Json<Value>, JsonRejection>) -> Result<T, Response> {
    let Json(value) = body.map_err(|rej| {
        warn!(error = %rej.body_text(), "unreadable request body");
        bad_request(format!("Invalid request body: {}", rej.body_text()))
    })?;
    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "request body has wrong shape");
        bad_request(format!("Invalid request body: {e}"))
    })
}

/// Messages on the redirect path, paired with the frontend route to show.
fn finish_presentation(status: CanonicalStatus, raw: &str) -> (String, &'static str) {
    match status {
        CanonicalStatus::Success => ("Payment completed successfully".into(), "success"),
        CanonicalStatus::Pending => ("Payment is still pending".into(), "pending"),
        CanonicalStatus::Cancelled => ("Payment was cancelled".into(), "cancelled"),
        CanonicalStatus::Expired => ("Payment has expired".into(), "expired"),
        CanonicalStatus::Failed => ("Payment failed".into(), "failed"),
        CanonicalStatus::Unknown => (format!("Payment status: {raw}"), "error"),
    }
}

fn status_message(status: CanonicalStatus, raw: &str) -> String {
    match status {
        CanonicalStatus::Success => "Payment successful!".into(),
        CanonicalStatus::Pending => "Payment is pending".into(),
        CanonicalStatus::Cancelled => "Payment was cancelled".into(),
        CanonicalStatus::Expired => "Payment has expired".into(),
        CanonicalStatus::Failed => "Payment failed".into(),
        CanonicalStatus::Unknown => format!("Payment status: {raw}"),
    }
}

// ---------------------------------------------------------------------------
// GET /  GET /health
// ---------------------------------------------------------------------------

pub(crate) async fn info(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(InfoResponse {
        message: "Payment Backend Server",
        version: st.build.version,
        firebase_enabled: st.store_enabled(),
        environment: st.environment.clone(),
        endpoints: ENDPOINTS,
    })
}

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "OK",
        firebase_enabled: st.store_enabled(),
        timestamp: Utc::now(),
        uptime: st.uptime_secs(),
    })
}

// ---------------------------------------------------------------------------
// POST /generate-snap-token
// ---------------------------------------------------------------------------

pub(crate) async fn generate_snap_token(
    State(st): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let req: CreatePaymentRequest = match decode_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match st.engine.on_create(req).await {
        Ok(created) => reply(
            StatusCode::OK,
            SnapTokenResponse {
                success: true,
                snap_token: created.snap_token,
                redirect_url: created.redirect_url,
                order_id: created.order_id,
            },
        ),
        Err(ReconcileError::Gateway(e)) => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Failed to generate payment token").with_error(e.detail()),
        ),
        Err(e) => reconcile_error(e),
    }
}

// ---------------------------------------------------------------------------
// POST /midtrans-webhook
// ---------------------------------------------------------------------------

pub(crate) async fn midtrans_webhook(
    State(st): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let n: WebhookNotification = match decode_body(body) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    match st.engine.on_webhook(n).await {
        Ok(out) => reply(
            StatusCode::OK,
            WebhookResponse {
                success: true,
                message: "Webhook processed successfully",
                order_id: out.order_id,
                status: out.info.status(),
            },
        ),
        Err(e) => reconcile_error(e),
    }
}

// ---------------------------------------------------------------------------
// GET /payment-finish
// ---------------------------------------------------------------------------

pub(crate) async fn payment_finish(
    State(st): State<Arc<AppState>>,
    Query(q): Query<FinishQuery>,
) -> Response {
    let order_id = q.order_id.unwrap_or_default();
    if order_id.trim().is_empty() {
        return reply(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Order ID is required").with_redirect("error"),
        );
    }
    info!(order_id = %order_id, status_code = q.status_code.as_deref().unwrap_or(""), "payment finish");

    let source = PollSource::Redirect {
        status_hint: q.transaction_status.filter(|s| !s.trim().is_empty()),
    };
    match st.engine.on_poll(&order_id, source).await {
        Ok(out) => {
            let raw = out
                .transaction_status
                .unwrap_or_else(|| CanonicalStatus::Unknown.as_str().to_string());
            let (message, redirect) = finish_presentation(out.info.status(), &raw);
            reply(
                StatusCode::OK,
                FinishResponse {
                    success: out.info.is_paid(),
                    message,
                    order_id: out.order_id,
                    status: out.info.status(),
                    is_paid: out.info.is_paid(),
                    can_navigate_home: out.info.can_navigate_home(),
                    transaction_status: raw,
                    redirect,
                    gateway: out.gateway.map(GatewayDiagnostics::from),
                },
            )
        }
        Err(ReconcileError::Validation(msg)) => reply(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(msg).with_redirect("error"),
        ),
        Err(ReconcileError::NotFound { order_id }) => reply(
            StatusCode::NOT_FOUND,
            ErrorResponse::new("Payment not found")
                .with_order_id(order_id)
                .with_redirect("error"),
        ),
        Err(e) => reconcile_error(e),
    }
}

// ---------------------------------------------------------------------------
// GET /payment-status/:order_id
// ---------------------------------------------------------------------------

pub(crate) async fn payment_status_missing_id() -> Response {
    bad_request("Order ID is required")
}

pub(crate) async fn payment_status(
    State(st): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Response {
    match st.engine.on_poll(&order_id, PollSource::Explicit).await {
        Ok(out) => {
            let raw = out.transaction_status.clone();
            let message = status_message(
                out.info.status(),
                raw.as_deref().unwrap_or(CanonicalStatus::Unknown.as_str()),
            );
            reply(
                StatusCode::OK,
                PaymentStatusResponse {
                    success: true,
                    order_id: out.order_id,
                    status: out.info.status(),
                    is_paid: out.info.is_paid(),
                    can_navigate_home: out.info.can_navigate_home(),
                    transaction_status: raw,
                    message,
                    firebase_update_success: out.store_updated,
                    gateway: out.gateway.map(GatewayDiagnostics::from),
                },
            )
        }
        Err(e) => reconcile_error(e),
    }
}

// ---------------------------------------------------------------------------
// POST /reset  POST /reset-password
// ---------------------------------------------------------------------------

pub(crate) async fn send_email(
    State(st): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let req: EmailRequest = match decode_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let (Some(from), Some(to), Some(subject), Some(html)) = (req.from, req.to, req.subject, req.html)
    else {
        return bad_request("Missing required fields: from, to, subject, html");
    };

    let Some(mailer) = st.mailer.as_ref() else {
        return reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Email service not configured"),
        );
    };

    let msg = EmailMessage {
        from,
        to,
        subject,
        html,
    };
    match mailer.send(&msg).await {
        Ok(()) => {
            info!(to = %msg.to, "email sent");
            reply(
                StatusCode::OK,
                MessageResponse {
                    success: true,
                    message: "Email sent successfully",
                },
            )
        }
        Err(e) => {
            error!(to = %msg.to, error = %e, "email send failed");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Failed to send email").with_error(Value::String(e.reason())),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

pub(crate) async fn endpoint_not_found(method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    reply(
        StatusCode::NOT_FOUND,
        EndpointNotFoundResponse {
            success: false,
            message: "Endpoint not found",
            path: uri.path().to_string(),
            method: method.to_string(),
        },
    )
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// One HTTP status per error class.
fn reconcile_error(e: ReconcileError) -> Response {
    match e {
        ReconcileError::Validation(msg) => bad_request(msg),
        ReconcileError::Authentication { .. } => {
            reply(StatusCode::UNAUTHORIZED, ErrorResponse::new("Invalid signature"))
        }
        ReconcileError::NotFound { order_id } => reply(
            StatusCode::NOT_FOUND,
            ErrorResponse::new("Payment not found").with_order_id(order_id),
        ),
        ReconcileError::Gateway(g) => reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Payment gateway error").with_error(g.detail()),
        ),
    }
}
