//! Non-secret service settings.
//!
//! Precedence per setting: env var, then YAML, then built-in default.
//!
//! | setting            | env                       | yaml                          | default               |
//! |--------------------|---------------------------|-------------------------------|-----------------------|
//! | bind address       | `PAYSYNC_ADDR`, `PORT`    | `/server/addr`                | `0.0.0.0:3000`        |
//! | gateway mode       | `MIDTRANS_IS_PRODUCTION`  | `/gateway/mode`               | sandbox               |
//! | create timeout     |                           | `/gateway/create_timeout_ms`  | 15000                 |
//! | status timeout     |                           | `/gateway/status_timeout_ms`  | 10000                 |
//! | mail timeout       |                           | `/mail/timeout_ms`            | 15000                 |
//! | CORS origins       | `ALLOWED_ORIGINS`         | `/cors/allowed_origins`       | any                   |
//! | frontend base URL  | `FRONTEND_URL`            | `/frontend/base_url`          | `https://yourapp.com` |
//! | environment label  | `APP_ENV`                 | `/app/environment`            | `development`         |
//! | store pool size    |                           | `/store/max_connections`      | 5                     |

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::read_str_at;

pub const DEFAULT_FRONTEND_URL: &str = "https://yourapp.com";
const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Sandbox,
    Production,
}

impl GatewayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayMode::Sandbox => "sandbox",
            GatewayMode::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        *self == GatewayMode::Production
    }

    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(GatewayMode::Sandbox),
            "production" => Ok(GatewayMode::Production),
            other => bail!(
                "CONFIG_INVALID /gateway/mode: unrecognised mode '{}'; expected sandbox | production",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub bind_addr: SocketAddr,
    pub gateway_mode: GatewayMode,
    pub create_timeout: Duration,
    pub status_timeout: Duration,
    pub mail_timeout: Duration,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub frontend_base_url: String,
    pub environment: String,
    pub store_max_connections: u32,
}

pub fn resolve_settings<F>(config_json: &Value, env: F) -> Result<ServiceSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let bind_addr = match env("PAYSYNC_ADDR").or_else(|| read_str_at(config_json, "/server/addr")) {
        Some(a) => a
            .trim()
            .parse()
            .with_context(|| format!("CONFIG_INVALID bind address '{a}'"))?,
        None => match env("PORT") {
            Some(p) => {
                let port: u16 = p
                    .trim()
                    .parse()
                    .with_context(|| format!("CONFIG_INVALID PORT '{p}'"))?;
                SocketAddr::from((DEFAULT_ADDR.0, port))
            }
            None => SocketAddr::from(DEFAULT_ADDR),
        },
    };

    // The flag is production only when it is exactly "true".
    let gateway_mode = match env("MIDTRANS_IS_PRODUCTION") {
        Some(flag) if flag.trim() == "true" => GatewayMode::Production,
        Some(_) => GatewayMode::Sandbox,
        None => match read_str_at(config_json, "/gateway/mode") {
            Some(m) => GatewayMode::parse(&m)?,
            None => GatewayMode::Sandbox,
        },
    };

    let allowed_origins = match env("ALLOWED_ORIGINS") {
        Some(list) => split_origins(&list),
        None => config_json
            .pointer("/cors/allowed_origins")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .flat_map(split_origins)
                    .collect()
            })
            .unwrap_or_default(),
    };

    Ok(ServiceSettings {
        bind_addr,
        gateway_mode,
        create_timeout: millis_at(config_json, "/gateway/create_timeout_ms", 15_000)?,
        status_timeout: millis_at(config_json, "/gateway/status_timeout_ms", 10_000)?,
        mail_timeout: millis_at(config_json, "/mail/timeout_ms", 15_000)?,
        allowed_origins,
        frontend_base_url: env("FRONTEND_URL")
            .or_else(|| read_str_at(config_json, "/frontend/base_url"))
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        environment: env("APP_ENV")
            .or_else(|| read_str_at(config_json, "/app/environment"))
            .unwrap_or_else(|| "development".to_string()),
        store_max_connections: match config_json.pointer("/store/max_connections") {
            None => 5,
            Some(v) => match v.as_u64() {
                Some(n) if (1..=u32::MAX as u64).contains(&n) => n as u32,
                _ => bail!("CONFIG_INVALID /store/max_connections: expected a positive integer"),
            },
        },
    })
}

/// `"*"` entries mean any origin and collapse to the empty list.
fn split_origins(list: &str) -> Vec<String> {
    let origins: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}

fn millis_at(config: &Value, pointer: &str, default_ms: u64) -> Result<Duration> {
    match config.pointer(pointer) {
        None => Ok(Duration::from_millis(default_ms)),
        Some(v) => match v.as_u64() {
            Some(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => bail!("CONFIG_INVALID {pointer}: expected a positive integer of milliseconds"),
        },
    }
}
