//! Runtime secret resolution.
//!
//! # Contract
//! - YAML stores only env var NAMES under `*/keys_env/*` and
//!   `/store/database_url_env`; well-known names are used when absent.
//! - The gateway server key is required: resolution fails closed without it.
//! - Mail key and database URL are optional. A missing mail key disables
//!   the email endpoint; a missing database URL disables the record store.
//! - `Debug` redacts every value. Error messages name the env var, never
//!   its value.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::read_str_at;

pub const DEFAULT_SERVER_KEY_VAR: &str = "MIDTRANS_SERVER_KEY";
pub const DEFAULT_MAIL_KEY_VAR: &str = "MAILERSEND_API_KEY";
pub const DEFAULT_DATABASE_URL_VAR: &str = "PAYSYNC_DATABASE_URL";

#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Basic-auth user for the processor API and the webhook signing key.
    pub gateway_server_key: String,
    pub mail_api_key: Option<String>,
    pub database_url: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("gateway_server_key", &"<REDACTED>")
            .field("mail_api_key", &self.mail_api_key.as_ref().map(|_| "<REDACTED>"))
            .field("database_url", &self.database_url.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

struct SecretEnvNames {
    server_key: String,
    mail_key: String,
    database_url: String,
}

fn env_names(config_json: &Value) -> SecretEnvNames {
    let name = |ptr: &str, default: &str| {
        read_str_at(config_json, ptr).unwrap_or_else(|| default.to_string())
    };
    SecretEnvNames {
        server_key: name("/gateway/keys_env/server_key", DEFAULT_SERVER_KEY_VAR),
        mail_key: name("/mail/keys_env/api_key", DEFAULT_MAIL_KEY_VAR),
        database_url: name("/store/database_url_env", DEFAULT_DATABASE_URL_VAR),
    }
}

pub fn resolve_secrets<F>(config_json: &Value, env: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let names = env_names(config_json);
    let lookup = |var: &str| env(var).filter(|v| !v.trim().is_empty());

    let Some(gateway_server_key) = lookup(&names.server_key) else {
        bail!(
            "SECRETS_MISSING: required env var '{}' (payment gateway server key) is not set or empty",
            names.server_key
        );
    };

    Ok(ResolvedSecrets {
        gateway_server_key,
        mail_api_key: lookup(&names.mail_key),
        database_url: lookup(&names.database_url),
    })
}
