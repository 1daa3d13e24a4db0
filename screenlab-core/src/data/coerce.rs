//! Value coercion for loosely-typed source fields.
//!
//! Scraped sources deliver numbers as display text ("−3.52%", "3.55 T USD",
//! "1,204"). Each canonical field has a `FieldKind`; this module turns the raw
//! JSON value into a value of that kind, or reports why it cannot.

use crate::domain::FieldKind;
use serde_json::{Number, Value};
use thiserror::Error;

/// Display strings that mean "no value".
const PLACEHOLDERS: [&str; 6] = ["", "—", "–", "--", "-", "N/A"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    #[error("cannot read {raw:?} as a number")]
    NotANumber { raw: String },

    #[error("cannot read {raw:?} as a flag")]
    NotAFlag { raw: String },

    #[error("unexpected {found} value")]
    UnexpectedType { found: &'static str },
}

/// Coerce a raw value to the given kind. Placeholders become `Value::Null`.
pub fn coerce(kind: FieldKind, value: &Value) -> Result<Value, CoerceError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match kind {
        FieldKind::Number => coerce_number(value),
        FieldKind::Text => coerce_text(value),
        FieldKind::Flag => coerce_flag(value),
    }
}

fn coerce_number(value: &Value) -> Result<Value, CoerceError> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => Ok(parse_number(s)?
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        other => Err(CoerceError::UnexpectedType {
            found: super::json_type_name(other),
        }),
    }
}

fn coerce_text(value: &Value) -> Result<Value, CoerceError> {
    match value {
        Value::String(s) if is_placeholder(s.trim()) => Ok(Value::Null),
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(CoerceError::UnexpectedType {
            found: super::json_type_name(other),
        }),
    }
}

fn coerce_flag(value: &Value) -> Result<Value, CoerceError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Ok(Value::Bool(false)),
            Some(x) if x == 1.0 => Ok(Value::Bool(true)),
            _ => Err(CoerceError::NotAFlag { raw: n.to_string() }),
        },
        Value::String(s) => {
            let t = s.trim();
            if is_placeholder(t) {
                return Ok(Value::Null);
            }
            match t.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                _ => Err(CoerceError::NotAFlag { raw: s.clone() }),
            }
        }
        other => Err(CoerceError::UnexpectedType {
            found: super::json_type_name(other),
        }),
    }
}

fn is_placeholder(s: &str) -> bool {
    PLACEHOLDERS.iter().any(|p| p.eq_ignore_ascii_case(s))
}

/// Parse a display number.
///
/// Accepts a unicode minus, thousands separators (`,` or whitespace between
/// three-digit groups), exponent notation, a trailing `%`, a leading
/// currency symbol, trailing unit words, and a `K`/`M`/`B`/`T` magnitude
/// suffix. Returns `Ok(None)` for placeholders. Anything left over that is
/// not a suffix or a unit word is an error, never silently dropped.
pub fn parse_number(raw: &str) -> Result<Option<f64>, CoerceError> {
    let cleaned: String = raw
        .trim()
        .replace('\u{2212}', "-")
        .chars()
        .filter(|c| !matches!(c, ',' | '%' | '$' | '€' | '£' | '+'))
        .collect();
    let cleaned = cleaned.trim();
    if is_placeholder(cleaned) {
        return Ok(None);
    }

    let not_a_number = || CoerceError::NotANumber {
        raw: raw.to_string(),
    };

    let mut tokens = cleaned.split_whitespace().peekable();
    let mut numeric = tokens.next().ok_or_else(not_a_number)?.to_string();
    while let Some(group) = tokens.peek() {
        if !is_integer_part(&numeric) || !is_digit_group(group) {
            break;
        }
        numeric.push_str(group);
        tokens.next();
    }

    let (base, mut scale) = match numeric.parse::<f64>() {
        Ok(base) => (base, None),
        Err(_) => {
            let split = numeric
                .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
                .unwrap_or(numeric.len());
            let (digits, suffix) = numeric.split_at(split);
            let base = digits.parse::<f64>().map_err(|_| not_a_number())?;
            match magnitude(suffix) {
                Some(m) => (base, Some(m)),
                None if is_unit_word(suffix) => (base, None),
                None => return Err(not_a_number()),
            }
        }
    };

    for word in tokens {
        match magnitude(word) {
            Some(m) if scale.is_none() => scale = Some(m),
            Some(_) => return Err(not_a_number()),
            None if is_unit_word(word) => {}
            None => return Err(not_a_number()),
        }
    }

    let value = base * scale.unwrap_or(1.0);
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(not_a_number())
    }
}

/// Multiplier for a standalone magnitude suffix ("M" in "3.5M" or "37.58 M").
fn magnitude(word: &str) -> Option<f64> {
    match word {
        "K" | "k" => Some(1e3),
        "M" | "m" => Some(1e6),
        "B" | "b" => Some(1e9),
        "T" | "t" => Some(1e12),
        _ => None,
    }
}

/// Currency or unit words such as "USD" or "MXN".
fn is_unit_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(char::is_alphabetic)
}

/// Leading digits that may continue with a whitespace-separated group.
fn is_integer_part(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// A thousands group: exactly three digits, optionally with a fraction.
fn is_digit_group(s: &str) -> bool {
    let (int, frac) = s.split_once('.').unwrap_or((s, ""));
    int.len() == 3
        && int.chars().all(|c| c.is_ascii_digit())
        && frac.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_display_numbers() {
        assert_eq!(parse_number("1,204").unwrap(), Some(1204.0));
        assert_eq!(parse_number("\u{2212}3.52%").unwrap(), Some(-3.52));
        assert_eq!(parse_number("+0.59%").unwrap(), Some(0.59));
        assert_eq!(parse_number("477.40 USD").unwrap(), Some(477.40));
        assert_eq!(parse_number("$12.5").unwrap(), Some(12.5));
    }

    #[test]
    fn applies_magnitude_suffixes() {
        let approx = |raw: &str, expected: f64| {
            let got = parse_number(raw).unwrap().unwrap();
            assert!((got - expected).abs() / expected < 1e-12, "{raw}: {got}");
        };
        approx("3.55 T USD", 3.55e12);
        approx("37.58 M", 37.58e6);
        approx("128.682M", 128.682e6);
        assert_eq!(parse_number("2.5B").unwrap(), Some(2.5e9));
        assert_eq!(parse_number("900k").unwrap(), Some(900_000.0));
        assert_eq!(parse_number("12 MXN").unwrap(), Some(12.0));
    }

    #[test]
    fn whitespace_thousands_groups() {
        assert_eq!(parse_number("1 234 567").unwrap(), Some(1_234_567.0));
        assert_eq!(parse_number("1\u{a0}234").unwrap(), Some(1234.0));
        assert_eq!(parse_number("-12 500.75 USD").unwrap(), Some(-12_500.75));
        assert_eq!(parse_number("2 500 M").unwrap(), Some(2.5e9));
    }

    #[test]
    fn exponent_notation() {
        assert_eq!(parse_number("1e5").unwrap(), Some(100_000.0));
        assert_eq!(parse_number("2.5E-3").unwrap(), Some(0.0025));
        assert_eq!(parse_number("1.2e3 USD").unwrap(), Some(1200.0));
    }

    #[test]
    fn leftover_digits_are_never_dropped() {
        for raw in ["1 23", "1 2345", "12.5 7", "3.5 M 2", "1e5x2", "4 T T"] {
            assert!(
                matches!(parse_number(raw), Err(CoerceError::NotANumber { .. })),
                "{raw:?} should not parse"
            );
        }
        assert!(parse_number("inf").is_err());
        assert!(parse_number("NaN").is_err());
    }

    #[test]
    fn placeholders_are_null() {
        for p in ["", "—", "--", "-", "N/A", "n/a", "  "] {
            assert_eq!(parse_number(p).unwrap(), None, "placeholder {p:?}");
        }
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            parse_number("abc"),
            Err(CoerceError::NotANumber { .. })
        ));
        assert!(parse_number("1.2.3").is_err());
    }

    #[test]
    fn numbers_pass_through_untouched() {
        assert_eq!(coerce(FieldKind::Number, &json!(120)).unwrap(), json!(120));
        assert_eq!(coerce(FieldKind::Number, &json!(0.8)).unwrap(), json!(0.8));
        assert_eq!(
            coerce(FieldKind::Number, &json!("1.5K")).unwrap(),
            json!(1500.0)
        );
    }

    #[test]
    fn number_rejects_structures() {
        assert_eq!(
            coerce(FieldKind::Number, &json!([1, 2])),
            Err(CoerceError::UnexpectedType { found: "array" })
        );
        assert!(coerce(FieldKind::Number, &json!(true)).is_err());
    }

    #[test]
    fn text_coercion() {
        assert_eq!(coerce(FieldKind::Text, &json!("Tech")).unwrap(), json!("Tech"));
        assert_eq!(coerce(FieldKind::Text, &json!(42)).unwrap(), json!("42"));
        assert_eq!(coerce(FieldKind::Text, &json!("—")).unwrap(), Value::Null);
    }

    #[test]
    fn flag_coercion() {
        assert_eq!(coerce(FieldKind::Flag, &json!(true)).unwrap(), json!(true));
        assert_eq!(coerce(FieldKind::Flag, &json!("Yes")).unwrap(), json!(true));
        assert_eq!(coerce(FieldKind::Flag, &json!("false")).unwrap(), json!(false));
        assert_eq!(coerce(FieldKind::Flag, &json!(0)).unwrap(), json!(false));
        assert!(coerce(FieldKind::Flag, &json!("maybe")).is_err());
        assert!(coerce(FieldKind::Flag, &json!(2)).is_err());
    }

    #[test]
    fn null_is_null_for_every_kind() {
        for kind in [FieldKind::Number, FieldKind::Text, FieldKind::Flag] {
            assert_eq!(coerce(kind, &Value::Null).unwrap(), Value::Null);
        }
    }
}
