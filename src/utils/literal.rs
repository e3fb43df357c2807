//! Safe parsing of Python-style list literals.
//!
//! Only the shapes a model is asked to produce are accepted: quoted strings
//! (single or double quotes, backslash escapes, adjacent literals
//! concatenated) and numbers, separated by commas, with an optional trailing
//! comma. Nested containers, names and expressions are rejected. Nothing is
//! ever evaluated.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// Why a list body could not be parsed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LiteralError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Expected ',' or end of list at offset {offset}")]
    MissingSeparator { offset: usize },

    #[error("Unsupported literal '{0}': only strings and numbers are allowed")]
    Unsupported(String),
}

/// Parses the body of a list literal, i.e. the text between `[` and `]`.
///
/// Numbers are returned in their source spelling so every element is a string.
pub fn parse_literal_list(body: &str) -> Result<Vec<String>, LiteralError> {
    let mut parser = LiteralParser {
        source: body,
        chars: body.char_indices().peekable(),
    };
    parser.parse_items()
}

struct LiteralParser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl LiteralParser<'_> {
    fn parse_items(&mut self) -> Result<Vec<String>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(&(offset, c)) = self.chars.peek() else {
                return Ok(items);
            };
            let item = match c {
                '"' | '\'' => self.parse_strings()?,
                '0'..='9' | '-' | '+' | '.' => self.parse_number()?,
                c if c.is_alphabetic() || c == '_' => {
                    return Err(LiteralError::Unsupported(self.take_word()));
                }
                '[' | '{' | '(' => {
                    return Err(LiteralError::Unsupported(c.to_string()));
                }
                ch => return Err(LiteralError::UnexpectedChar { ch, offset }),
            };
            items.push(item);

            self.skip_whitespace();
            match self.chars.next() {
                None => return Ok(items),
                Some((_, ',')) => continue,
                Some((offset, _)) => return Err(LiteralError::MissingSeparator { offset }),
            }
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn parse_strings(&mut self) -> Result<String, LiteralError> {
        let mut value = self.parse_string()?;
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some(&(_, '"' | '\'')) => value.push_str(&self.parse_string()?),
                _ => return Ok(value),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let Some((offset, quote)) = self.chars.next() else {
            return Err(LiteralError::UnterminatedString {
                offset: self.source.len(),
            });
        };
        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                c if c == quote => return Ok(value),
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => self.push_escape(&mut value, escaped),
                    None => break,
                },
                c => value.push(c),
            }
        }
        Err(LiteralError::UnterminatedString { offset })
    }

    fn push_escape(&mut self, value: &mut String, escaped: char) {
        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            '0' => value.push('\0'),
            '\\' | '\'' | '"' => value.push(escaped),
            '\n' => {}
            'x' => self.push_code_point(value, 'x', 2),
            'u' => self.push_code_point(value, 'u', 4),
            other => {
                value.push('\\');
                value.push(other);
            }
        }
    }

    fn push_code_point(&mut self, value: &mut String, marker: char, digits: usize) {
        let mut hex = String::with_capacity(digits);
        while hex.len() < digits {
            match self.chars.peek() {
                Some(&(_, c)) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.chars.next();
                }
                _ => break,
            }
        }
        let decoded = (hex.len() == digits)
            .then(|| u32::from_str_radix(&hex, 16).ok())
            .flatten()
            .and_then(char::from_u32);
        match decoded {
            Some(c) => value.push(c),
            None => {
                value.push('\\');
                value.push(marker);
                value.push_str(&hex);
            }
        }
    }

    fn parse_number(&mut self) -> Result<String, LiteralError> {
        let start = self.chars.peek().map(|&(i, _)| i).unwrap_or(0);
        let mut end = start;
        let mut digits = 0;
        let mut prev = ' ';
        while let Some(&(i, c)) = self.chars.peek() {
            let sign_ok = matches!(c, '-' | '+') && (i == start || matches!(prev, 'e' | 'E'));
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_') || sign_ok {
                if c.is_ascii_digit() {
                    digits += 1;
                }
                prev = c;
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.source[start..end];
        let candidate = text.replace('_', "");
        if digits == 0 || candidate.parse::<f64>().is_err() {
            return Err(LiteralError::Unsupported(text.to_string()));
        }
        Ok(text.to_string())
    }

    fn take_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        word
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_and_single_quoted_strings() {
        let parsed = parse_literal_list(r#""a", 'b', "c d""#).expect("should parse");
        assert_eq!(parsed, vec!["a", "b", "c d"]);
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(parse_literal_list("").expect("should parse"), Vec::<String>::new());
        assert_eq!(parse_literal_list("   ").expect("should parse"), Vec::<String>::new());
    }

    #[test]
    fn test_trailing_comma_allowed() {
        let parsed = parse_literal_list(r#""a", "b","#).expect("should parse");
        assert_eq!(parsed, vec!["a", "b"]);
    }

    #[test]
    fn test_escapes() {
        let parsed = parse_literal_list(r#""say \"hi\"", 'it\'s', "tab\there", "é""#)
            .expect("should parse");
        assert_eq!(parsed, vec!["say \"hi\"", "it's", "tab\there", "é"]);
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        let parsed = parse_literal_list(r#""abc" "def", "g""#).expect("should parse");
        assert_eq!(parsed, vec!["abcdef", "g"]);
    }

    #[test]
    fn test_numbers_keep_spelling() {
        let parsed = parse_literal_list("1, -2.5, 3e4").expect("should parse");
        assert_eq!(parsed, vec!["1", "-2.5", "3e4"]);
    }

    #[test]
    fn test_unicode_content() {
        let parsed = parse_literal_list(r#""café ☕", "日本語""#).expect("should parse");
        assert_eq!(parsed, vec!["café ☕", "日本語"]);
    }

    #[test]
    fn test_rejects_names_and_containers() {
        assert_eq!(
            parse_literal_list(r#""a", os"#),
            Err(LiteralError::Unsupported("os".to_string()))
        );
        assert!(matches!(
            parse_literal_list(r#"{"a": 1}"#),
            Err(LiteralError::Unsupported(_))
        ));
        assert!(matches!(
            parse_literal_list("True"),
            Err(LiteralError::Unsupported(_))
        ));
    }

    #[test]
    fn test_rejects_missing_separator() {
        assert!(matches!(
            parse_literal_list(r#""a" 5"#),
            Err(LiteralError::MissingSeparator { .. })
        ));
    }

    #[test]
    fn test_rejects_unterminated_string() {
        assert_eq!(
            parse_literal_list(r#""a", "b"#),
            Err(LiteralError::UnterminatedString { offset: 5 })
        );
    }

    #[test]
    fn test_rejects_bare_punctuation() {
        assert!(matches!(
            parse_literal_list(r#""a",, "b""#),
            Err(LiteralError::UnexpectedChar { ch: ',', .. })
        ));
    }
}
