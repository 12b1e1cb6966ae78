//! paysync-config
//!
//! # Contract
//! - YAML files are optional and layered: later files override earlier ones
//!   (deep merge). The merged document is canonicalised and hashed so the
//!   daemon can log a stable `config_hash` at boot.
//! - YAML never holds secret values, only the NAMES of the env vars that do
//!   (`CONFIG_SECRET_DETECTED` otherwise).
//! - Everything is resolved once at startup through an env lookup closure;
//!   the resulting [`ServiceSettings`] and [`ResolvedSecrets`] are passed to
//!   constructors. Nothing else in the workspace reads `std::env`.

mod layering;
pub mod secrets;
pub mod settings;
mod unused;

pub use layering::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
pub use secrets::{resolve_secrets, ResolvedSecrets};
pub use settings::{resolve_settings, GatewayMode, ServiceSettings};
pub use unused::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport, CONSUMED_POINTERS};

/// Process-environment lookup for [`resolve_settings`] / [`resolve_secrets`].
/// Unset and blank values are both `None`.
pub fn process_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Read a non-blank string at `pointer`.
pub(crate) fn read_str_at(config: &serde_json::Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}
