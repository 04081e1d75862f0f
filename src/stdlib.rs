//! Conversions behind the `TrasformaIn*` built-ins.

use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::value::Value;

/// Convert to an integer. Floats are truncated toward zero; strings must
/// hold an integer literal, optionally signed and padded with whitespace.
pub fn to_integer(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Float(f) => {
            let truncated = f.trunc();
            if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(truncated as i64)
            } else {
                Err(not_convertible(value, "Intero"))
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Str(s) => parse_integer(s).ok_or_else(|| not_convertible(value, "Intero")),
        Value::Null | Value::Function(_) => Err(not_convertible(value, "Intero")),
    }
}

pub fn to_float(value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(f) => Ok(*f),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Str(s) => parse_float(s).ok_or_else(|| not_convertible(value, "Virgola")),
        Value::Null | Value::Function(_) => Err(not_convertible(value, "Virgola")),
    }
}

/// Numbers are true when non-zero; strings must spell `vero` or `falso`.
pub fn to_bool(value: &Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(n) => Ok(*n != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::Str(s) => match s.trim() {
            "vero" => Ok(true),
            "falso" => Ok(false),
            _ => Err(not_convertible(value, "Booleano")),
        },
        Value::Null | Value::Function(_) => Err(not_convertible(value, "Booleano")),
    }
}

/// Parse `-? DIGIT+`, trimming surrounding whitespace.
pub fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse `-? DIGIT+ ("." DIGIT+)?`, trimming surrounding whitespace.
///
/// Rejects forms Rust's float parser would accept but the language has no
/// literal for, such as `inf`, `1e5` or `.5`.
pub fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !fraction.is_none_or(all_digits) {
        return None;
    }
    s.parse().ok()
}

fn not_convertible(value: &Value, target: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::MismatchedType,
        format!(
            "cannot convert {} '{value}' to {target}",
            value.type_name()
        ),
    )
}
