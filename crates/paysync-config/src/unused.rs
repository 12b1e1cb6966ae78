//! Unused-key guard.
//!
//! "Consumed pointers" are JSON Pointer prefixes: `/gateway` consumes
//! `/gateway/mode` but not `/gatewayx`. Any leaf not under a consumed
//! prefix is reported as unused.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every pointer the daemon actually reads.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/server/addr",
    "/app/environment",
    "/gateway/mode",
    "/gateway/create_timeout_ms",
    "/gateway/status_timeout_ms",
    "/gateway/keys_env",
    "/mail/timeout_ms",
    "/mail/keys_env",
    "/store/database_url_env",
    "/store/max_connections",
    "/cors/allowed_origins",
    "/frontend/base_url",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Sorted, unique.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !CONSUMED_POINTERS.iter().any(|p| covers(p, leaf)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s): {:?}",
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers.iter().take(12).collect::<Vec<_>>()
        );
    }
    Ok(report)
}

fn covers(prefix: &str, leaf: &str) -> bool {
    leaf == prefix
        || leaf
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub(crate) fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            // An empty object at the root has no leaves.
            for (k, child) in map {
                let token = k.replace('~', "~0").replace('/', "~1");
                collect_leaf_pointers(child, &format!("{prefix}/{token}"), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_leaf_pointers(child, &format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_respects_segment_boundary() {
        assert!(covers("/gateway/mode", "/gateway/mode"));
        assert!(covers("/gateway/keys_env", "/gateway/keys_env/server_key"));
        assert!(!covers("/gateway/mode", "/gateway/modes"));
    }

    #[test]
    fn array_leaves_are_indexed() {
        let v = serde_json::json!({"cors": {"allowed_origins": ["a", "b"]}});
        let mut out = Vec::new();
        collect_leaf_pointers(&v, "", &mut out);
        assert_eq!(out, vec!["/cors/allowed_origins/0", "/cors/allowed_origins/1"]);
    }
}
