//! Field-level coercion from CSV text to typed values.
//!
//! Every parser here is total: malformed input resolves to the field's
//! default and never aborts the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::literal::{parse_literal, LiteralError};

/// Characters of an unparsable value shown in warnings.
const PREVIEW_CHARS: usize = 50;

/// Parse a nested list column such as `genres` or `keywords`.
///
/// Blank input and the literal `null` yield an empty list. Otherwise the
/// value is decoded in three tiers:
/// 1. quote/`None` rewrite followed by strict JSON decoding
/// 2. the lenient Python-literal parser
/// 3. give up with a warning and an empty list
pub fn parse_list_field<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Vec::new();
    }

    match decode_list::<T>(trimmed) {
        Ok(items) => items,
        Err(e) => {
            warn!(
                preview = %preview(trimmed),
                error = %e,
                "Could not parse nested field, using empty list"
            );
            Vec::new()
        }
    }
}

/// Tiers 1 and 2 of [`parse_list_field`], without the fallback.
pub fn decode_list<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, LiteralError> {
    let rewritten = replace_token(raw, "None", "null").replace('\'', "\"");
    if let Ok(items) = serde_json::from_str::<Vec<T>>(&rewritten) {
        return Ok(items);
    }

    let value = parse_literal(raw)?;
    serde_json::from_value::<Vec<T>>(value).map_err(|e| LiteralError {
        position: 0,
        reason: format!("unexpected shape: {}", e),
    })
}

/// Integer column: `0` when unparsable.
///
/// Accepts plain integers, finite decimals (truncated toward zero) and a
/// leading signed digit run such as `"120 min"`.
pub fn parse_int(raw: &str) -> i64 {
    let text = raw.trim();
    if let Ok(n) = text.parse::<i64>() {
        return n;
    }
    if let Some(f) = parse_finite(text) {
        return f.trunc() as i64;
    }
    text.get(..leading_integer_len(text))
        .and_then(|prefix| prefix.parse::<i64>().ok())
        .unwrap_or(0)
}

/// Float column: `0.0` when unparsable or non-finite.
pub fn parse_float(raw: &str) -> f64 {
    let text = raw.trim();
    if let Some(f) = parse_finite(text) {
        return f;
    }
    text.get(..leading_decimal_len(text))
        .and_then(parse_finite)
        .unwrap_or(0.0)
}

/// Boolean column: true only for a case-insensitive `"true"`.
pub fn parse_bool(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

/// Date column: `None` when blank or unparsable.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Text column: `default` when empty, otherwise the source text unchanged.
pub fn text_or(raw: &str, default: &str) -> String {
    if raw.is_empty() {
        default.to_string()
    } else {
        raw.to_string()
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn leading_integer_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'-') | Some(b'+')));
    let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        0
    } else {
        sign + digits
    }
}

fn leading_decimal_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'-') | Some(b'+')));
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-') | Some(b'+')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    end
}

/// Replace the identifier `word` with `replacement`, leaving quoted
/// strings and longer identifiers untouched.
fn replace_token(text: &str, word: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut token = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if c.is_alphanumeric() || c == '_' {
            token.push(c);
            continue;
        }

        flush_token(&mut out, &mut token, word, replacement);
        if c == '\'' || c == '"' {
            quote = Some(c);
        }
        out.push(c);
    }

    flush_token(&mut out, &mut token, word, replacement);
    out
}

fn flush_token(out: &mut String, token: &mut String, word: &str, replacement: &str) {
    if token.as_str() == word {
        out.push_str(replacement);
    } else {
        out.push_str(token);
    }
    token.clear();
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
