//! Flow-style YAML encoding of variable values
//!
//! Pipeline properties and step parameters are stored as `odo:yamlLiteral`
//! text. Every string is double quoted, collections use flow syntax, and the
//! encoding parses back (with any YAML 1.2 reader) to a structurally equal
//! value.

use serde_yaml::Value;
use std::fmt::Write;

/// Encode a YAML value on a single line in flow style
pub fn to_flow_yaml(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_quoted(out, s),
        Value::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Mapping(mapping) => {
            out.push('{');
            for (i, (key, item)) in mapping.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, key);
                out.push_str(": ");
                write_value(out, item);
            }
            out.push('}');
        }
        Value::Tagged(tagged) => {
            let _ = write!(out, "{} ", tagged.tag);
            write_value(out, &tagged.value);
        }
    }
}

fn write_number(out: &mut String, n: &serde_yaml::Number) {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_nan() => out.push_str(".nan"),
        Some(f) if n.is_f64() && f.is_infinite() => {
            out.push_str(if f > 0.0 { ".inf" } else { "-.inf" })
        }
        _ => {
            let _ = write!(out, "{n}");
        }
    }
}

/// Double-quoted YAML scalar with escapes
fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Render a scalar as plain text, as used for names and identifiers
///
/// Returns `None` for null, collections and tagged values.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(source: &str) {
        let original: Value = serde_yaml::from_str(source).unwrap();
        let encoded = to_flow_yaml(&original);
        assert!(!encoded.contains('\n'), "not single-line: {encoded}");
        let decoded: Value = serde_yaml::from_str(&encoded).unwrap();
        assert_eq!(decoded, original, "encoded as {encoded}");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(to_flow_yaml(&Value::from(1)), "1");
        assert_eq!(to_flow_yaml(&Value::from("csv")), "\"csv\"");
        assert_eq!(to_flow_yaml(&Value::Bool(true)), "true");
        assert_eq!(to_flow_yaml(&Value::Null), "null");
    }

    #[test]
    fn test_collections() {
        let value: Value = serde_yaml::from_str("{fields: [lat, lon], skip: 2}").unwrap();
        assert_eq!(
            to_flow_yaml(&value),
            "{\"fields\": [\"lat\", \"lon\"], \"skip\": 2}"
        );
    }

    #[test]
    fn test_round_trips() {
        round_trip("42");
        round_trip("-3.25");
        round_trip("\"1\"");
        round_trip("\"true\"");
        round_trip("with \"quotes\" and \\ backslash");
        round_trip("\"line one\\nline two\\ttab\"");
        round_trip("[1, two, [3.5, null], {k: v}]");
        round_trip("{resources: [res1], fields: {depth: {type: number, unit: m}}}");
        round_trip("{1: one, true: yes-string}");
        round_trip("[]");
        round_trip("{}");
        round_trip("-.inf");
    }

    #[test]
    fn test_nan_encoding() {
        let encoded = to_flow_yaml(&Value::from(f64::NAN));
        assert_eq!(encoded, ".nan");
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&Value::from(1234)), Some("1234".to_string()));
        assert_eq!(scalar_text(&Value::from("abc")), Some("abc".to_string()));
        assert_eq!(scalar_text(&Value::Sequence(vec![])), None);
    }
}
