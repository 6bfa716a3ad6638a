//! Lenient parser for Python-literal style data.
//!
//! Nested CSV columns are exported as Python `repr()` output rather than
//! JSON: strings use single quotes, null is `None`, booleans are `True` /
//! `False` and tuples may appear. This module reads that syntax into a
//! [`serde_json::Value`] without evaluating anything.
//!
//! Supported syntax:
//! - `None`, `True`, `False` (and the JSON spellings `null`, `true`, `false`)
//! - integers and floats with optional sign, fraction and exponent
//! - single- or double-quoted strings with backslash escapes
//! - lists `[...]`, tuples `(...)` (read as arrays) and dicts `{...}`
//! - trailing commas in any container

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Maximum container nesting accepted before giving up.
const MAX_DEPTH: usize = 64;

/// Why a literal could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at byte {position}")]
pub struct LiteralError {
    /// Byte offset into the input.
    pub position: usize,
    /// Human-readable reason.
    pub reason: String,
}

/// Parse a single Python-style literal.
///
/// Leading and trailing whitespace is ignored; anything else after the
/// literal is an error.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = LiteralParser::new(input);
    parser.skip_whitespace();
    let value = parser.parse_value(0)?;
    parser.skip_whitespace();
    if parser.pos < input.len() {
        return Err(parser.error("unexpected trailing characters"));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, reason: impl Into<String>) -> LiteralError {
        LiteralError {
            position: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{}`, found `{}`", expected, c))),
            None => Err(self.error(format!("expected `{}`, found end of input", expected))),
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, LiteralError> {
        if depth > MAX_DEPTH {
            return Err(self.error(format!("nesting exceeds maximum depth of {}", MAX_DEPTH)));
        }

        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => self.parse_sequence('[', ']', depth).map(Value::Array),
            Some('(') => self.parse_sequence('(', ')', depth).map(Value::Array),
            Some('{') => self.parse_dict(depth),
            Some('\'') | Some('"') => self.parse_string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected character `{}`", c))),
        }
    }

    fn parse_sequence(
        &mut self,
        open: char,
        close: char,
        depth: usize,
    ) -> Result<Vec<Value>, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }

            items.push(self.parse_value(depth + 1)?);
            self.skip_whitespace();

            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok(items);
                }
                _ => return Err(self.error(format!("expected `,` or `{}`", close))),
            }
        }
    }

    fn parse_dict(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }

            let key = match self.parse_value(depth + 1)? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => (if b { "True" } else { "False" }).to_string(),
                Value::Null => "None".to_string(),
                _ => return Err(self.error("dict keys must be scalars")),
            };

            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);
            self.skip_whitespace();

            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.error("expected `,` or `}`")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let quote = self
            .bump()
            .ok_or_else(|| self.error("unexpected end of input"))?;
        let mut out = String::new();

        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => {
                    return Err(LiteralError {
                        position: start,
                        reason: "unterminated string".to_string(),
                    })
                }
            };

            if c == quote {
                return Ok(out);
            }

            if c != '\\' {
                out.push(c);
                continue;
            }

            let escaped = self
                .bump()
                .ok_or_else(|| self.error("unterminated escape sequence"))?;
            match escaped {
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                'x' => out.push(self.parse_hex_escape(2)?),
                'u' => out.push(self.parse_hex_escape(4)?),
                'U' => out.push(self.parse_hex_escape(8)?),
                '\n' => {}
                other => {
                    // Unknown escapes are kept verbatim, as Python does.
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn parse_hex_escape(&mut self, digits: usize) -> Result<char, LiteralError> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated hex escape"))?;
        let code =
            u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        let c = char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?;
        self.pos = end;
        Ok(c)
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut end = self.pos;

        if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
            end += 1;
        }
        let mut is_float = false;
        while end < bytes.len() {
            match bytes[end] {
                b'0'..=b'9' | b'_' => end += 1,
                b'.' => {
                    is_float = true;
                    end += 1;
                }
                b'e' | b'E' => {
                    is_float = true;
                    end += 1;
                    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
                        end += 1;
                    }
                }
                _ => break,
            }
        }

        let text: String = self.src[start..end].chars().filter(|c| *c != '_').collect();
        self.pos = end;

        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
        }

        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or(LiteralError {
                position: start,
                reason: format!("invalid number `{}`", text),
            })
    }

    fn parse_keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        match &self.src[start..self.pos] {
            "None" | "null" => Ok(Value::Null),
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            other => Err(LiteralError {
                position: start,
                reason: format!("unknown identifier `{}`", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_quoted_list_of_dicts() {
        let value = parse_literal("[{'id': 28, 'name': 'Action'}, {'id': 12, 'name': 'Adventure'}]")
            .unwrap();
        assert_eq!(
            value,
            json!([{"id": 28, "name": "Action"}, {"id": 12, "name": "Adventure"}])
        );
    }

    #[test]
    fn test_none_true_false() {
        let value = parse_literal("{'logo_path': None, 'a': True, 'b': False}").unwrap();
        assert_eq!(value, json!({"logo_path": null, "a": true, "b": false}));
    }

    #[test]
    fn test_apostrophe_inside_double_quotes() {
        let value = parse_literal(r#"[{'id': 7, 'name': "L'Oréal Studio"}]"#).unwrap();
        assert_eq!(value, json!([{"id": 7, "name": "L'Oréal Studio"}]));
    }

    #[test]
    fn test_escapes() {
        let value = parse_literal(r"'it\'s a \x41é\n'").unwrap();
        assert_eq!(value, json!("it's a Aé\n"));
    }

    #[test]
    fn test_tuples_and_trailing_commas() {
        let value = parse_literal("[(1, 2,), {'k': -3.5e1,},]").unwrap();
        assert_eq!(value, json!([[1, 2], {"k": -35.0}]));
    }

    #[test]
    fn test_rejects_expressions() {
        assert!(parse_literal("__import__('os').system('ls')").is_err());
        assert!(parse_literal("[1 + 2]").is_err());
        assert!(parse_literal("[1] [2]").is_err());
    }

    #[test]
    fn test_unterminated_string_reports_start() {
        let err = parse_literal("['abc").unwrap_err();
        assert_eq!(err.position, 1);
        assert!(err.reason.contains("unterminated"));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}{}", "[".repeat(MAX_DEPTH + 2), "]".repeat(MAX_DEPTH + 2));
        let err = parse_literal(&deep).unwrap_err();
        assert!(err.reason.contains("maximum depth"));

        let ok = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&ok).is_ok());
    }
}
