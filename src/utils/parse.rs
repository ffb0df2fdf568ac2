// zohosync/src/utils/parse.rs
//! Normalization of loosely typed CRM field values.
//!
//! None of these functions fail: anything that cannot be interpreted falls
//! back to the supplied default.

use serde_json::Value;
use tracing::debug;

/// Parses a float from a number or numeric string, falling back to `default`.
pub fn parse_float(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        None | Some(Value::Null) => return default,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    parsed.unwrap_or_else(|| {
        debug!("Invalid float value {:?}, using default {}", value, default);
        default
    })
}

/// Parses an integer, unwrapping a single-element multi-select list first.
pub fn parse_int(value: Option<&Value>, default: i32) -> i32 {
    let parsed = match value {
        None | Some(Value::Null) => return default,
        Some(Value::Array(items)) if items.len() == 1 => scalar_to_int(&items[0]),
        Some(other) => scalar_to_int(other),
    };
    parsed.unwrap_or_else(|| {
        debug!("Invalid integer value {:?}, using default {}", value, default);
        default
    })
}

/// Rooms and bathrooms: for a list, the largest entry made only of digits
/// (0 when there is none); for a scalar, a plain integer parse. Defaults to 0.
pub fn parse_rooms(value: Option<&Value>, field_name: &str) -> i32 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let text = scalar_text(item)?;
                if is_ascii_digits(&text) {
                    text.parse::<i32>().ok()
                } else {
                    None
                }
            })
            .fold(0, i32::max),
        Some(other) => scalar_to_int(other).unwrap_or_else(|| {
            debug!("Invalid value for {}: {:?}. Using 0.", field_name, other);
            0
        }),
    }
}

/// Splits a comma separated string into trimmed, non-empty segments.
pub fn split_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn scalar_to_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                let f = n.as_f64()?.trunc();
                if f >= i32::MIN as f64 && f <= i32::MAX as f64 {
                    Some(f as i32)
                } else {
                    None
                }
            }
        }
        Value::String(s) => s.trim().parse::<i32>().ok(),
        Value::Bool(b) => Some(i32::from(*b)),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_ascii_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
