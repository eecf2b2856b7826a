//! Strict parsing of dictionary-literal text embedded in coverage metadata.
//!
//! Encoding blocks are written as Python-style literals, e.g.
//! `{'0': 'GFDL-CM3', 1: 'NCAR-CCSM4'}`. They are rewritten token by token into
//! JSON (single-quoted strings, bare numeric keys, `True`/`False`/`None`,
//! tuples and trailing commas) and then handed to `serde_json`. Anything outside
//! that grammar is rejected rather than guessed at.

use std::iter::Peekable;
use std::str::Chars;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Parse a dictionary literal into a JSON object.
pub fn parse_dict(text: &str) -> Result<Map<String, Value>> {
    let json = normalize(text)?;
    let value: Value = serde_json::from_str(&json)
        .map_err(|e| Error::InvalidLiteral(format!("{e}: {text}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidLiteral(format!(
            "expected a dictionary, got {other}"
        ))),
    }
}

/// Rewrite a Python-style literal into JSON text.
pub fn normalize(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let s = read_string(c, &mut chars)?;
                out.push_str(&serde_json::to_string(&s)?);
            }
            '-' | '+' | '.' | '0'..='9' => {
                let mut token = String::new();
                if c != '+' {
                    token.push(c);
                }
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || matches!(n, '.' | '_' | '+' | '-') {
                        if n != '_' {
                            token.push(n);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = python_number(&token)?;
                let ws = take_whitespace(&mut chars);
                if chars.peek() == Some(&':') {
                    // Bare numeric dictionary key.
                    out.push_str(&serde_json::to_string(&number)?);
                } else {
                    out.push_str(&number);
                }
                out.push_str(&ws);
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' {
                        ident.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match ident.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    _ => {
                        return Err(Error::InvalidLiteral(format!(
                            "unexpected identifier `{ident}`"
                        )));
                    }
                });
            }
            ',' => {
                let ws = take_whitespace(&mut chars);
                if !matches!(chars.peek(), Some('}' | ']' | ')')) {
                    out.push(',');
                }
                out.push_str(&ws);
            }
            '(' => out.push('['),
            ')' => out.push(']'),
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Rewrite a Python numeric literal as JSON number text.
///
/// Prefixed integers (`0x1F`, `0o17`, `0b101`) become decimal, and bare
/// fractions (`.5`, `5.`, `5.e3`) gain the digit JSON requires.
fn python_number(token: &str) -> Result<String> {
    let (sign, digits) = match token.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", token),
    };

    let radix = match digits.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let value = i64::from_str_radix(&digits[2..], radix)
            .map_err(|e| Error::InvalidLiteral(format!("invalid number {token}: {e}")))?;
        return Ok(format!("{sign}{value}"));
    }

    let mut number = String::with_capacity(token.len() + 2);
    number.push_str(sign);
    if digits.starts_with('.') {
        number.push('0');
    }
    let mut chars = digits.chars().peekable();
    while let Some(c) = chars.next() {
        number.push(c);
        if c == '.' && !chars.peek().is_some_and(|n| n.is_ascii_digit()) {
            number.push('0');
        }
    }
    Ok(number)
}

fn take_whitespace(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ws = String::new();
    while let Some(&n) = chars.peek() {
        if n.is_whitespace() {
            ws.push(n);
            chars.next();
        } else {
            break;
        }
    }
    ws
}

fn read_string(quote: char, chars: &mut Peekable<Chars<'_>>) -> Result<String> {
    let mut s = String::new();
    loop {
        let Some(c) = chars.next() else {
            return Err(Error::InvalidLiteral("unterminated string".into()));
        };
        match c {
            c if c == quote => return Ok(s),
            '\\' => {
                let Some(e) = chars.next() else {
                    return Err(Error::InvalidLiteral("unterminated escape".into()));
                };
                match e {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    '0' => s.push('\0'),
                    '\\' | '\'' | '"' => s.push(e),
                    'x' => s.push(read_hex_escape(chars, 2)?),
                    'u' => s.push(read_hex_escape(chars, 4)?),
                    // Unknown escapes are kept verbatim.
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn read_hex_escape(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Result<char> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return Err(Error::InvalidLiteral(format!("truncated escape \\{hex}")));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| Error::InvalidLiteral(format!("invalid escape \\{hex}")))
}
