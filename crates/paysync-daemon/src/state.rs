//! Shared runtime state for paysync-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. Everything in here is
//! built once at boot and read-only afterwards.

use std::sync::Arc;
use std::time::Instant;

use paysync_mail::Mailer;
use paysync_reconcile::ReconciliationEngine;

/// Static build metadata included in info responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: ReconciliationEngine,
    /// `None` when no mail API key is configured.
    pub mailer: Option<Arc<dyn Mailer>>,
    pub build: BuildInfo,
    /// Deployment label reported by `GET /`.
    pub environment: String,
    started_at: Instant,
}

impl AppState {
    pub fn new(engine: ReconciliationEngine) -> Self {
        Self {
            engine,
            mailer: None,
            build: BuildInfo::current(),
            environment: "development".to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn store_enabled(&self) -> bool {
        self.engine.store_enabled()
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
