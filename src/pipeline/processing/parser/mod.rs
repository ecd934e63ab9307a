//! Typed shapes for the three source exports.
//!
//! Only the fields the pipeline reads are declared; everything else in a line
//! is skipped by serde. Declared fields are tolerant: a value of the wrong
//! shape reads as absent, so the stage decides whether that is a filter or a
//! missing field. Only JSON syntax errors and lines that are not objects are
//! malformed.

pub mod categories;
pub mod directory;
pub mod precise;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse one source line, which must be a JSON object.
pub(crate) fn from_object_line<T: DeserializeOwned>(line: &[u8]) -> Result<T, String> {
    let first = line.iter().find(|b| !b.is_ascii_whitespace());
    if first != Some(&b'{') {
        return Err("line is not a JSON object".to_string());
    }
    serde_json::from_slice(line).map_err(|e| e.to_string())
}

/// Strings and numbers as text; every other shape is absent.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept a string or a number; `null`, blanks and non-scalars become `None`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(scalar_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Accept a number or a numeric string; anything else becomes `None`.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// List of codes given as strings or numbers. Non-scalar elements are skipped
/// and anything that is not a list becomes empty.
pub(crate) fn code_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items.into_iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    })
}

/// List of nested entries. Elements that do not fit `T` are skipped and
/// anything that is not a list becomes empty.
pub(crate) fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Nested block that reads as absent when it does not fit `T`.
pub(crate) fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => T::deserialize(value).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Inner {
        #[serde(default, deserialize_with = "lenient_string")]
        name: Option<String>,
    }

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_string")]
        s: Option<String>,
        #[serde(default, deserialize_with = "lenient_f64")]
        f: Option<f64>,
        #[serde(default, deserialize_with = "code_list")]
        codes: Vec<String>,
        #[serde(default, deserialize_with = "nullable_vec")]
        items: Vec<Inner>,
        #[serde(default, deserialize_with = "lenient_object")]
        inner: Option<Inner>,
    }

    #[test]
    fn scalars_are_accepted_as_strings_or_numbers() {
        let p: Sample = serde_json::from_str(r#"{"s": 10115, "f": "13.5", "codes": ["a", 7]}"#).unwrap();
        assert_eq!(p.s.as_deref(), Some("10115"));
        assert_eq!(p.f, Some(13.5));
        assert_eq!(p.codes, vec!["a".to_string(), "7".to_string()]);
    }

    #[test]
    fn blanks_and_nulls_are_absent() {
        let p: Sample = serde_json::from_str(r#"{"s": "   ", "f": null, "codes": null, "items": null}"#).unwrap();
        assert_eq!(p.s, None);
        assert_eq!(p.f, None);
        assert!(p.codes.is_empty());
        assert!(p.items.is_empty());

        let p: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(p.s, None);
        assert!(p.inner.is_none());
    }

    #[test]
    fn wrong_shapes_read_as_absent() {
        let p: Sample = serde_json::from_str(
            r#"{
                "s": {"nested": 1},
                "f": true,
                "codes": [{"id": 1200}, "4711", [1]],
                "items": [{"name": "kept"}, "stray", {"name": ["x"]}],
                "inner": "not a block"
            }"#,
        )
        .unwrap();
        assert_eq!(p.s, None);
        assert_eq!(p.f, None);
        assert_eq!(p.codes, ["4711"]);
        assert_eq!(p.items.len(), 2);
        assert_eq!(p.items[0].name.as_deref(), Some("kept"));
        assert_eq!(p.items[1].name, None);
        assert!(p.inner.is_none());

        let p: Sample = serde_json::from_str(r#"{"codes": "4711", "items": {"name": "x"}}"#).unwrap();
        assert!(p.codes.is_empty());
        assert!(p.items.is_empty());
    }

    #[test]
    fn only_object_lines_parse() {
        assert!(from_object_line::<Sample>(br#"  {"s": "x"}"#).is_ok());
        assert!(from_object_line::<Sample>(b"[\"x\", 1]").is_err());
        assert!(from_object_line::<Sample>(b"42").is_err());
        assert!(from_object_line::<Sample>(b"{\"s\": ").is_err());
    }
}
