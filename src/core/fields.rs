use crate::domain::model::{Category, Service};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]").expect("valid regex"));

/// Normalizes free text into an id: lowercase ASCII letters, digits and `_`,
/// with whitespace runs collapsed to a single `_`.
pub fn slugify(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let underscored = WHITESPACE_RUN.replace_all(&lowered, "_");
    NON_SLUG_CHARS.replace_all(&underscored, "").into_owned()
}

/// Parses a trimmed string as a number, truncated toward zero.
/// Unsigned `0x`/`0o`/`0b` literals are accepted. Empty, unparseable or
/// non-finite input yields `fallback` (an empty string is not 0).
pub fn to_int_str(raw: &str, fallback: i64) -> i64 {
    let trimmed = raw.trim();
    if let Some(n) = parse_radix_literal(trimmed) {
        return n;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => n.trunc() as i64,
        _ => fallback,
    }
}

fn parse_radix_literal(s: &str) -> Option<i64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.starts_with(['+', '-']) {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

/// [`to_int_str`] over a JSON value; numbers are used directly, strings
/// are parsed, everything else falls back.
pub fn to_int(raw: Option<&Value>, fallback: i64) -> i64 {
    match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(fallback),
        Some(Value::String(s)) => to_int_str(s, fallback),
        _ => fallback,
    }
}

/// Scalar JSON value rendered as a string; null, missing and
/// non-scalar values become the empty string. Integer-valued floats
/// print without a fraction (`1.0` becomes `"1"`).
pub fn scalar_string(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub fn is_truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Display order: `order` ascending, ties broken by label.
///
/// Labels compare by code point, not by locale collation, so among equal
/// orders `Ä` and `Ö` sort after `Z` rather than with Finnish rules.
pub fn by_order(a: &Category, b: &Category) -> Ordering {
    a.order.cmp(&b.order).then_with(|| a.label.cmp(&b.label))
}

pub fn sorted_categories(categories: &[Category]) -> Vec<Category> {
    let mut sorted = categories.to_vec();
    sorted.sort_by(by_order);
    sorted
}

/// Services by numeric `service_id` (non-numeric ids count as 0), stable.
pub fn sorted_services(services: &[Service]) -> Vec<&Service> {
    let mut sorted: Vec<&Service> = services.iter().collect();
    sorted.sort_by_key(|s| to_int_str(&s.service_id, 0));
    sorted
}
