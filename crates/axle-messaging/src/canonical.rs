//! Canonical JSON
//!
//! Object keys are sorted by their UTF-8 bytes at every depth, array order is
//! kept, and no whitespace is emitted. Strings, integers and literals use
//! serde_json's rendering. Floats are printed the way ECMAScript prints a
//! Number: integral values drop the `.0`, `-0` prints as `0`, and exponent
//! form is used only below 1e-6 or at 1e21 and above.

use serde::Serialize;
use serde_json::Value;

use crate::{MessagingError, Result};

/// Canonical string form of a JSON value
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Canonical bytes of any serializable value
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value).map_err(|e| MessagingError::Json {
        message: e.to_string(),
    })?;
    Ok(to_canonical_string(&value).into_bytes())
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_scalar(&Value::String(key.clone()), out);
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        scalar => write_scalar(scalar, out),
    }
}

fn write_scalar(value: &Value, out: &mut String) {
    match value {
        Value::Number(number) if number.is_f64() => match number.as_f64() {
            Some(float) => out.push_str(&format_float(float)),
            None => out.push_str(&number.to_string()),
        },
        // Display on a scalar Value is its compact JSON form
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// ECMAScript `Number::toString` for a finite float
fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return "null".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e2`
    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let sign = if e >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, e.abs())
        }
    };

    if value < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_recursively() {
        let value = json!({"b": 1, "a": {"z": true, "m": null}, "c": [3, 1, 2]});
        assert_eq!(
            to_canonical_string(&value),
            r#"{"a":{"m":null,"z":true},"b":1,"c":[3,1,2]}"#
        );
    }

    #[test]
    fn test_strings_escaped() {
        let value = json!({"k": "line\n\"quoted\""});
        assert_eq!(to_canonical_string(&value), r#"{"k":"line\n\"quoted\""}"#);
    }

    #[test]
    fn test_floats_match_ecmascript() {
        let value: Value = serde_json::from_str(r#"{"a":1.0,"b":1e2,"c":1e21,"d":-0.0}"#).unwrap();
        assert_eq!(to_canonical_string(&value), r#"{"a":1,"b":100,"c":1e+21,"d":0}"#);
        assert_eq!(to_canonical_string(&json!({"price": 2.0})), r#"{"price":2}"#);
    }

    #[test]
    fn test_float_fraction_and_exponent_forms() {
        let cases = [
            (0.1, "0.1"),
            (-2.5, "-2.5"),
            (123.456, "123.456"),
            (0.000001, "0.000001"),
            (1.5e-7, "1.5e-7"),
            (1e-7, "1e-7"),
            (1.25e22, "1.25e+22"),
            (123456789012345680000.0, "123456789012345680000"),
            (-1e300, "-1e+300"),
        ];
        for (float, expected) in cases {
            assert_eq!(to_canonical_string(&json!(float)), expected, "{}", float);
        }
    }

    #[test]
    fn test_integers_keep_serde_rendering() {
        let value = json!({"n": -42, "big": u64::MAX});
        assert_eq!(to_canonical_string(&value), format!(r#"{{"big":{},"n":-42}}"#, u64::MAX));
    }

    #[test]
    fn test_objects_in_arrays_sorted() {
        let value = json!([{"y": 1, "x": 2}]);
        assert_eq!(to_canonical_string(&value), r#"[{"x":2,"y":1}]"#);
    }
}
