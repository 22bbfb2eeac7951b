//! Immutable cursor over a command line.
//!
//! Every read returns the value together with a *new* cursor; the cursor it
//! was called on is left untouched. That is what lets the dispatcher try one
//! argument parser, throw the result away and try the next sibling from the
//! exact same position.
//!
//!   let c = Cursor::new(r#""my home" 1 2"#);
//!   let (name, c) = c.read_string()?;   // name == "my home"
//!   let c = c.skip_whitespace();        // c.remaining() == "1 2"

use thiserror::Error;

const QUOTE: char = '"';
const ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("expected {0}")]
    Expected(&'static str),

    #[error("unclosed quoted string")]
    UnterminatedQuote,

    #[error("invalid escape sequence '\\{0}' in quoted string")]
    InvalidEscape(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset into the original input.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// True when the cursor sits on whitespace or at the end of input, i.e.
    /// the previous token is complete.
    pub fn at_separator(&self) -> bool {
        self.peek().is_none_or(char::is_whitespace)
    }

    fn advance(self, bytes: usize) -> Self {
        Self {
            input: self.input,
            pos: (self.pos + bytes).min(self.input.len()),
        }
    }

    pub fn skip_whitespace(self) -> Self {
        let rest = self.remaining();
        let trimmed = rest.trim_start();
        self.advance(rest.len() - trimmed.len())
    }

    /// Reads up to the next whitespace. May return an empty token when the
    /// cursor is already on a separator.
    pub fn read_unquoted(self) -> (&'a str, Self) {
        let rest = self.remaining();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        (&rest[..end], self.advance(end))
    }

    /// Reads a `"..."` literal. Inside the quotes `\"` and `\\` are the only
    /// escapes.
    pub fn read_quoted(self) -> Result<(String, Self), ReadError> {
        let rest = self.remaining();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, QUOTE)) => {}
            _ => return Err(ReadError::Expected("start of quoted string")),
        }

        let mut out = String::new();
        let mut escaped = false;
        for (idx, ch) in chars {
            if escaped {
                match ch {
                    QUOTE | ESCAPE => out.push(ch),
                    other => return Err(ReadError::InvalidEscape(other)),
                }
                escaped = false;
            } else if ch == ESCAPE {
                escaped = true;
            } else if ch == QUOTE {
                return Ok((out, self.advance(idx + ch.len_utf8())));
            } else {
                out.push(ch);
            }
        }

        Err(ReadError::UnterminatedQuote)
    }

    /// Quoted literal when the next char is `"`, a single unquoted token
    /// otherwise.
    pub fn read_string(self) -> Result<(String, Self), ReadError> {
        match self.peek() {
            Some(QUOTE) => self.read_quoted(),
            Some(_) => {
                let (tok, next) = self.read_unquoted();
                if tok.is_empty() {
                    return Err(ReadError::Expected("string"));
                }
                Ok((tok.to_string(), next))
            }
            None => Err(ReadError::Expected("string")),
        }
    }
}

/// Quotes `s` so that `read_string` gives it back unchanged.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(QUOTE);
    for ch in s.chars() {
        if ch == QUOTE || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
    out.push(QUOTE);
    out
}
