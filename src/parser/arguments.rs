//! Argument list handling for a single directive.
//!
//! The scanner hands over the raw text between the parentheses. This module
//! splits it into entries, validates keys and coerces each value into a
//! [`ParamValue`].

use crate::core::error::DirectiveError;
use crate::core::types::{ParamValue, Parameters};

/// Characters allowed in directive names and argument keys.
pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Parse the inside of `@name( ... )` into a parameter map.
///
/// Entries are comma separated; commas inside quotes do not split. Empty
/// entries are ignored and a later duplicate key replaces the earlier value
/// while keeping its original position.
pub(crate) fn parse_arguments(name: &str, args: &str) -> Result<Parameters, DirectiveError> {
    let mut parameters = Parameters::new();

    for entry in split_unquoted(args, b',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (key, value) = match split_unquoted(entry, b'=').as_slice() {
            [key] => (key.trim(), None),
            [key, value] => (key.trim(), Some(value.trim())),
            _ => {
                return Err(DirectiveError::InvalidValue {
                    name: name.to_string(),
                    key: entry.to_string(),
                    value: entry.to_string(),
                })
            }
        };

        if key.is_empty() || !key.bytes().all(is_name_byte) {
            return Err(DirectiveError::InvalidKey {
                name: name.to_string(),
                key: key.to_string(),
            });
        }

        let value = match value {
            None => ParamValue::Boolean(true),
            Some(raw) => resolve_value(raw).ok_or_else(|| DirectiveError::InvalidValue {
                name: name.to_string(),
                key: key.to_string(),
                value: raw.to_string(),
            })?,
        };

        parameters.insert(key.to_string(), value);
    }

    Ok(parameters)
}

/// Coerce a raw value: integer, then fractional, then quoted text, then a
/// bare word.
pub(crate) fn resolve_value(raw: &str) -> Option<ParamValue> {
    if is_integer(raw) {
        let number = raw
            .parse::<i64>()
            .map(|n| n as f64)
            .or_else(|_| raw.parse::<f64>())
            .ok()?;
        return Some(ParamValue::Number(number));
    }
    if is_fractional(raw) {
        return raw.parse::<f64>().ok().map(ParamValue::Number);
    }
    if raw.starts_with('"') {
        return unquote(raw).map(ParamValue::Text);
    }
    if !raw.is_empty() && raw.bytes().all(is_word_byte) {
        return Some(ParamValue::Text(raw.to_string()));
    }
    None
}

fn is_word_byte(b: u8) -> bool {
    is_name_byte(b) || matches!(b, b'#' | b'.' | b'+')
}

fn strip_sign(raw: &str) -> &str {
    raw.strip_prefix(['+', '-']).unwrap_or(raw)
}

/// `[+-]?digits`
fn is_integer(raw: &str) -> bool {
    let digits = strip_sign(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `[+-]?digits.digits`, with either side allowed to be empty but not both.
fn is_fractional(raw: &str) -> bool {
    let Some((whole, frac)) = strip_sign(raw).split_once('.') else {
        return false;
    };
    (!whole.is_empty() || !frac.is_empty())
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// Strip the surrounding quotes and resolve escapes.
///
/// `\"`, `\(`, `\)` and `\\` become the escaped character; any other
/// backslash is kept as written. Returns `None` unless the closing quote is
/// the last character.
fn unquote(raw: &str) -> Option<String> {
    let mut chars = raw.strip_prefix('"')?.chars();
    let mut text = String::new();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '(' | ')' | '\\')) => text.push(escaped),
                Some(other) => {
                    text.push('\\');
                    text.push(other);
                }
                None => return None,
            },
            '"' => return chars.next().is_none().then_some(text),
            other => text.push(other),
        }
    }

    None
}

/// Split on `delimiter` wherever it appears outside double quotes.
///
/// Backslash escapes are honoured inside quotes only.
fn split_unquoted(text: &str, delimiter: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quote => i += 1,
            b'"' => in_quote = !in_quote,
            b if b == delimiter && !in_quote => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_patterns() {
        assert_eq!(resolve_value("20"), Some(ParamValue::Number(20.0)));
        assert_eq!(resolve_value("-3"), Some(ParamValue::Number(-3.0)));
        assert_eq!(resolve_value("+1.5"), Some(ParamValue::Number(1.5)));
        assert_eq!(resolve_value(".5"), Some(ParamValue::Number(0.5)));
        assert_eq!(resolve_value("5."), Some(ParamValue::Number(5.0)));
        assert_eq!(resolve_value("."), Some(ParamValue::Text(".".into())));
        assert_eq!(resolve_value("1.2.3"), Some(ParamValue::Text("1.2.3".into())));
    }

    #[test]
    fn test_quoted_values() {
        assert_eq!(resolve_value("\"below\""), Some(ParamValue::Text("below".into())));
        assert_eq!(
            resolve_value(r#""say \"hi\" \(now\) \\ \n""#),
            Some(ParamValue::Text(r#"say "hi" (now) \ \n"#.into()))
        );
        assert_eq!(resolve_value("\"\""), Some(ParamValue::Text(String::new())));
        assert_eq!(resolve_value("\"open"), None);
        assert_eq!(resolve_value("\"a\"b"), None);
    }

    #[test]
    fn test_bare_words() {
        assert_eq!(resolve_value("above"), Some(ParamValue::Text("above".into())));
        assert_eq!(resolve_value("#f0f0f0"), Some(ParamValue::Text("#f0f0f0".into())));
        assert_eq!(resolve_value("two words"), None);
        assert_eq!(resolve_value(""), None);
    }

    #[test]
    fn test_arguments_with_flags_and_duplicates() {
        let params = parse_arguments("x", " amount = 2 , fast, amount=3 ,, ").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["amount"], ParamValue::Number(3.0));
        assert_eq!(params["fast"], ParamValue::Boolean(true));
        assert_eq!(params.get_index(0).map(|(k, _)| k.as_str()), Some("amount"));
    }

    #[test]
    fn test_comma_inside_quotes() {
        let params = parse_arguments("x", r#"label="a,b=c", n=1"#).unwrap();
        assert_eq!(params["label"], ParamValue::Text("a,b=c".into()));
        assert_eq!(params["n"], ParamValue::Number(1.0));
    }

    #[test]
    fn test_invalid_entries() {
        assert!(matches!(
            parse_arguments("x", "bad key=1"),
            Err(DirectiveError::InvalidKey { .. })
        ));
        assert!(matches!(
            parse_arguments("x", "=1"),
            Err(DirectiveError::InvalidKey { .. })
        ));
        assert!(matches!(
            parse_arguments("x", "amount="),
            Err(DirectiveError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_arguments("x", "a=1=2"),
            Err(DirectiveError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_arguments() {
        assert!(parse_arguments("x", "").unwrap().is_empty());
        assert!(parse_arguments("x", "   ").unwrap().is_empty());
    }
}
