//! paysync-daemon entry point.
//!
//! Thin by design: load config, build the engine and its adapters, wire
//! middleware, serve. Route handlers live in `routes.rs`; shared state in
//! `state.rs`.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use paysync_config::{
    load_layered_yaml, process_env, report_unused_keys, resolve_secrets, resolve_settings,
    LoadedConfig, ResolvedSecrets, ServiceSettings, UnusedKeyPolicy,
};
use paysync_daemon::{routes, state::AppState};
use paysync_db::PgPaymentStore;
use paysync_gateway::{MidtransClient, MidtransEndpoints};
use paysync_mail::MailerSendClient;
use paysync_reconcile::{ReconciliationEngine, RecordStore};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "paysync-daemon")]
#[command(about = "Payment gateway proxy and status reconciliation service", long_about = None)]
struct Args {
    /// YAML config layer; repeat to stack (later wins).
    #[arg(long = "config")]
    config: Vec<PathBuf>,

    /// Bind address; overrides PAYSYNC_ADDR / PORT / config.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Dev convenience; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    init_tracing();

    let loaded = if args.config.is_empty() {
        LoadedConfig::empty()
    } else {
        load_layered_yaml(args.config.as_slice()).context("config load failed")?
    };
    info!(config_hash = %loaded.config_hash, layers = args.config.len(), "config loaded");

    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !unused.is_clean() {
        warn!(keys = ?unused.unused_leaf_pointers, "CONFIG_UNUSED_KEYS: ignored config keys");
    }

    let mut settings = resolve_settings(&loaded.config_json, process_env)?;
    if let Some(addr) = args.addr {
        settings.bind_addr = addr;
    }
    let secrets = resolve_secrets(&loaded.config_json, process_env)?;
    info!(
        mode = settings.gateway_mode.as_str(),
        environment = %settings.environment,
        "settings resolved"
    );

    let store = connect_store(&settings, &secrets).await;
    let gateway = MidtransClient::new(
        secrets.gateway_server_key.clone(),
        MidtransEndpoints::for_mode(settings.gateway_mode),
        settings.create_timeout,
        settings.status_timeout,
    )
    .context("payment gateway client")?;

    let engine = ReconciliationEngine::new(
        Arc::new(gateway),
        store,
        secrets.gateway_server_key.clone(),
    )
    .with_finish_base_url(settings.frontend_base_url.clone());

    let mut app_state = AppState::new(engine).with_environment(settings.environment.clone());
    match &secrets.mail_api_key {
        Some(key) => {
            app_state =
                app_state.with_mailer(Arc::new(MailerSendClient::new(key.clone(), settings.mail_timeout)));
        }
        None => warn!("mail API key not set; email endpoints will answer 500"),
    }
    let shared = Arc::new(app_state);

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(routes::cors_layer(&settings.allowed_origins));

    let addr = settings.bind_addr;
    info!(
        "paysync-daemon listening on http://{} (record store {})",
        addr,
        if shared.store_enabled() { "enabled" } else { "disabled" }
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// No database URL, or a failed connect/migrate, leaves the store disabled.
async fn connect_store(settings: &ServiceSettings, secrets: &ResolvedSecrets) -> RecordStore {
    let Some(url) = secrets.database_url.as_deref() else {
        info!("no database URL; record store disabled");
        return RecordStore::Disabled;
    };

    let pool = match paysync_db::connect(url, settings.store_max_connections).await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "record store unavailable; continuing without it");
            return RecordStore::Disabled;
        }
    };
    let store = PgPaymentStore::new(pool);
    if let Err(e) = paysync_db::migrate(store.pool()).await {
        warn!(error = %format!("{e:#}"), "record store migration failed; continuing without it");
        return RecordStore::Disabled;
    }
    RecordStore::connected(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
