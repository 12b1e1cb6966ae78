//! Serde helpers for client and processor payloads that send numbers as
//! either JSON numbers or numeric strings.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Leading-integer parse: optional sign followed by digits; anything after
/// the digit run is ignored (`"10000.00"` => 10000). `None` if no digits.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let t = s.trim();
    let (neg, rest) = match t.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let digits: &str = &rest[..rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(rest.len())];
    if digits.is_empty() {
        return None;
    }
    let n: i64 = digits.parse().ok()?;
    Some(if neg { -n } else { n })
}

/// Integer from a JSON value. Floats are truncated.
pub fn value_as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

/// Textual form of a scalar JSON value. Blank strings and non-scalars are `None`.
pub fn value_as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn int<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    value_as_int(&v).ok_or_else(|| de::Error::custom(format!("expected an integer, got {v}")))
}

pub fn opt_int<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(v) => value_as_int(&v)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an integer, got {v}"))),
    }
}

pub fn opt_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_as_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leading_int_matches_client_behaviour() {
        assert_eq!(parse_leading_int("10000"), Some(10000));
        assert_eq!(parse_leading_int(" 10000.00 "), Some(10000));
        assert_eq!(parse_leading_int("-5x"), Some(-5));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn value_helpers() {
        assert_eq!(value_as_int(&json!(12.9)), Some(12));
        assert_eq!(value_as_int(&json!("7")), Some(7));
        assert_eq!(value_as_int(&json!(null)), None);
        assert_eq!(value_as_text(&json!(200)).as_deref(), Some("200"));
        assert_eq!(value_as_text(&json!("  ")), None);
        assert_eq!(value_as_text(&json!({"a": 1})), None);
    }
}
