//! Strict parser for the model's reply.
//!
//! The reply must be exactly one list literal of quoted strings, such as
//! `["check_missing_emails", 'flag_short_names']`. Nothing is evaluated:
//! anything outside this grammar is rejected.
//!
//! ```text
//! list   := ws '[' ws ( string ( ws ',' ws string )* ( ws ',' )? )? ws ']' ws
//! string := '"' chars '"' | "'" chars "'"
//! escape := '\\' ( '\\' | '\'' | '"' | 'n' | 't' | 'r' )
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use super::SelectionError;

/// Parse a normalized reply into its string elements, in order.
pub fn parse_filter_list(text: &str) -> Result<Vec<String>, SelectionError> {
    let mut cursor = Cursor::new(text);
    cursor.skip_whitespace();
    cursor.expect('[')?;

    let mut items = Vec::new();
    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some(']') => {
                cursor.bump();
                break;
            }
            Some(quote @ ('"' | '\'')) => {
                cursor.bump();
                items.push(cursor.string_body(quote)?);
            }
            Some(c) => return Err(cursor.error(&format!("expected a quoted string, found '{c}'"))),
            None => return Err(cursor.error("unterminated list")),
        }

        cursor.skip_whitespace();
        match cursor.peek() {
            Some(',') => {
                cursor.bump();
            }
            Some(']') => {
                cursor.bump();
                break;
            }
            Some(c) => return Err(cursor.error(&format!("expected ',' or ']', found '{c}'"))),
            None => return Err(cursor.error("unterminated list")),
        }
    }

    cursor.skip_whitespace();
    if let Some(c) = cursor.peek() {
        return Err(cursor.error(&format!("unexpected '{c}' after list")));
    }

    Ok(items)
}

struct Cursor<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            len: text.len(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.len, |&(i, _)| i)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectionError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(&format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(&format!("expected '{expected}', found end of input"))),
        }
    }

    /// Read a string body up to the closing `quote`; the opening quote is consumed.
    fn string_body(&mut self, quote: char) -> Result<String, SelectionError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c.is_control() => {
                    return Err(self.error(&format!("control character {c:?} inside string")))
                }
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        Some('"') => '"',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some(other) => {
                            return Err(self.error(&format!("unsupported escape '\\{other}'")))
                        }
                        None => return Err(self.error("unterminated string")),
                    };
                    out.push(escaped);
                }
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn error(&mut self, message: &str) -> SelectionError {
        let offset = self.offset();
        SelectionError::MalformedResponse(format!("{message} at byte {offset}"))
    }
}
