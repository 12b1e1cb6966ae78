use std::fs;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::unused::collect_leaf_pointers;

/// Secret-looking prefixes. Any leaf string in the merged config starting
/// with one of these aborts loading.
const SECRET_PREFIXES: &[&str] = &[
    "SB-Mid-server-", // Midtrans sandbox server key
    "Mid-server-",    // Midtrans production server key
    "SB-Mid-client-",
    "Mid-client-",
    "mlsn.",          // MailerSend API token
    "postgres://",    // connection strings carry credentials
    "postgresql://",
    "-----BEGIN",     // PEM private keys
    "sk_live",
    "sk_test",
];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// No files: an empty document. Every setting takes its default.
    pub fn empty() -> Self {
        load_layered_yaml_from_strings(&[]).unwrap_or_else(|_| LoadedConfig {
            config_hash: String::new(),
            canonical_json: "{}".to_string(),
            config_json: serde_json::json!({}),
        })
    }
}

pub fn load_layered_yaml<P: AsRef<std::path::Path>>(paths: &[P]) -> Result<LoadedConfig> {
    let mut docs = Vec::with_capacity(paths.len());
    for p in paths {
        let p = p.as_ref();
        let raw = fs::read_to_string(p)
            .with_context(|| format!("failed to read yaml path: {}", p.display()))?;
        docs.push(raw);
    }
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let doc: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty file parses as null; treat it as an empty layer.
        if doc.is_null() {
            continue;
        }
        let doc = serde_json::to_value(doc).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, doc);
    }

    reject_secret_literals(&merged)?;

    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut b), Value::Object(o)) => {
            for (k, ov) in o {
                let bv = b.remove(&k).unwrap_or(Value::Null);
                b.insert(k, deep_merge(bv, ov));
            }
            Value::Object(b)
        }
        (_, o) => o,
    }
}

fn reject_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);
    for ptr in leaves {
        let Some(s) = v.pointer(&ptr).and_then(Value::as_str) else {
            continue;
        };
        let t = s.trim();
        if t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p)) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}
