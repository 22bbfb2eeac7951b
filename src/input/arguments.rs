//! Argument parsers for command tree argument nodes.
//!
//! A parser turns the text at a [`Cursor`] into a typed value plus the cursor
//! just past what it consumed. Parsers never mutate anything; the ones that
//! look up live objects (groups, waypoints, players) only read.

use crate::input::reader::{Cursor, ReadError};
use crate::models::types::Dimension;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// Malformed token.
    #[error("{0}")]
    Parse(String),

    /// Well-formed token naming something that does not exist.
    #[error("{0}")]
    Resolution(String),
}

impl From<ReadError> for ArgumentError {
    fn from(e: ReadError) -> Self {
        ArgumentError::Parse(e.to_string())
    }
}

pub type Parsed<'a, T> = Result<(T, Cursor<'a>), ArgumentError>;

pub trait ArgumentParser: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Stable identifier, used to merge identical argument nodes.
    fn parser_id(&self) -> &str;

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, Self::Output>;
}

/// Type-erased parsed value as stored in a command context.
pub type ArgValue = Arc<dyn Any + Send + Sync>;

/// Object-safe face of [`ArgumentParser`], so nodes can hold parsers of
/// different output types.
pub trait DynParser: Send + Sync {
    fn parser_id(&self) -> &str;
    fn parse_dyn<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, ArgValue>;
}

impl<P: ArgumentParser> DynParser for P {
    fn parser_id(&self) -> &str {
        ArgumentParser::parser_id(self)
    }

    fn parse_dyn<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, ArgValue> {
        let (value, next) = self.parse(cursor)?;
        Ok((Arc::new(value) as ArgValue, next))
    }
}

/// Single token, or a `"quoted phrase"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringArg;

impl ArgumentParser for StringArg {
    type Output = String;

    fn parser_id(&self) -> &str {
        "string"
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, String> {
        Ok(cursor.read_string()?)
    }
}

/// Single unquoted token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordArg;

impl ArgumentParser for WordArg {
    type Output = String;

    fn parser_id(&self) -> &str {
        "word"
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, String> {
        let (tok, next) = cursor.read_unquoted();
        if tok.is_empty() {
            return Err(ArgumentError::Parse("expected word".into()));
        }
        Ok((tok.to_string(), next))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DoubleArg {
    min: f64,
    max: f64,
}

impl DoubleArg {
    pub fn between(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Default for DoubleArg {
    fn default() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
        }
    }
}

impl ArgumentParser for DoubleArg {
    type Output = f64;

    fn parser_id(&self) -> &str {
        "double"
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, f64> {
        let (tok, next) = cursor.read_unquoted();
        if tok.is_empty() {
            return Err(ArgumentError::Parse("expected double".into()));
        }

        let value: f64 = tok
            .parse()
            .map_err(|_| ArgumentError::Parse(format!("invalid double '{tok}'")))?;
        if !value.is_finite() {
            return Err(ArgumentError::Parse(format!("invalid double '{tok}'")));
        }
        if value < self.min {
            return Err(ArgumentError::Parse(format!(
                "double must not be less than {}, found {value}",
                self.min
            )));
        }
        if value > self.max {
            return Err(ArgumentError::Parse(format!(
                "double must not be more than {}, found {value}",
                self.max
            )));
        }

        Ok((value, next))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionArg;

impl ArgumentParser for DimensionArg {
    type Output = Dimension;

    fn parser_id(&self) -> &str {
        "dimension"
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, Dimension> {
        let (tok, next) = cursor.read_unquoted();
        let dim = Dimension::parse(tok)
            .ok_or_else(|| ArgumentError::Parse(format!("unknown dimension '{tok}'")))?;
        Ok((dim, next))
    }
}

pub fn string() -> StringArg {
    StringArg
}

pub fn word() -> WordArg {
    WordArg
}

pub fn double() -> DoubleArg {
    DoubleArg::default()
}

pub fn dimension() -> DimensionArg {
    DimensionArg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<P: ArgumentParser>(p: P, s: &str) -> Result<P::Output, ArgumentError> {
        p.parse(Cursor::new(s)).map(|(v, _)| v)
    }

    #[test]
    fn t_double() {
        assert_eq!(parse(double(), "1.5").unwrap(), 1.5);
        assert_eq!(parse(double(), "-20").unwrap(), -20.0);
        assert!(matches!(parse(double(), "abc"), Err(ArgumentError::Parse(_))));
        assert!(matches!(parse(double(), "1.0abc"), Err(ArgumentError::Parse(_))));
        assert!(matches!(parse(double(), "NaN"), Err(ArgumentError::Parse(_))));
        assert!(matches!(parse(double(), "inf"), Err(ArgumentError::Parse(_))));
        assert!(matches!(parse(double(), ""), Err(ArgumentError::Parse(_))));
    }

    #[test]
    fn t_double_range() {
        let p = DoubleArg::between(-64.0, 320.0);
        assert_eq!(parse(p, "320").unwrap(), 320.0);
        assert!(matches!(parse(p, "320.5"), Err(ArgumentError::Parse(_))));
        assert!(matches!(parse(p, "-65"), Err(ArgumentError::Parse(_))));
    }

    #[test]
    fn t_string_modes() {
        assert_eq!(parse(string(), "\"a b c\"").unwrap(), "a b c");
        assert_eq!(parse(string(), "a").unwrap(), "a");
        assert_eq!(parse(string(), "a b").unwrap(), "a");
    }

    #[test]
    fn t_word_does_not_unquote() {
        assert_eq!(parse(word(), "\"a b\"").unwrap(), "\"a");
    }

    #[test]
    fn t_dimension() {
        assert_eq!(parse(dimension(), "OVERWORLD").unwrap(), Dimension::Overworld);
        assert!(matches!(parse(dimension(), "moon"), Err(ArgumentError::Parse(_))));
    }

    #[test]
    fn t_erased_parser_keeps_type() {
        let p: Arc<dyn DynParser> = Arc::new(double());
        let (v, _) = p.parse_dyn(Cursor::new("2.5")).unwrap();
        assert_eq!(v.downcast_ref::<f64>(), Some(&2.5));
        assert_eq!(p.parser_id(), "double");
    }
}
