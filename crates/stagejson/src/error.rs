// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types shared by the contracts, the registry and the JSON codec.

use crate::contracts::BasicType;
use std::fmt;

/// Which side of a member access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "read"),
            AccessKind::Write => write!(f, "write"),
        }
    }
}

/// Category of a malformed-input failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input ended while a value was still open.
    UnexpectedEnd,
    /// A character that cannot start or continue the current construct.
    UnexpectedChar,
    /// Numeric literal that neither the fast path nor `str::parse` accepts.
    InvalidNumber,
    /// Literal that is not `true`, `false`, `null`, `undefined` or `ref_<n>`.
    InvalidLiteral,
    /// `\u` escape without exactly four hex digits.
    InvalidEscape,
    /// `ref_<n>` pointing past the registered destinations.
    UnknownReference(usize),
    /// Non-whitespace input after the top-level value.
    TrailingCharacters,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd => write!(f, "unexpected end of input"),
            Self::UnexpectedChar => write!(f, "unexpected character"),
            Self::InvalidNumber => write!(f, "invalid number"),
            Self::InvalidLiteral => write!(f, "invalid literal"),
            Self::InvalidEscape => write!(f, "invalid escape sequence"),
            Self::UnknownReference(n) => write!(f, "unknown reference ref_{}", n),
            Self::TrailingCharacters => write!(f, "trailing characters after value"),
        }
    }
}

/// Malformed JSON text, located precisely in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// Absolute byte index into the input.
    pub index: usize,
    /// Offending character, `None` at end of input.
    pub found: Option<char>,
}

impl ParseError {
    /// Locate `index` inside `text`. Only called on the failure path.
    pub fn locate(kind: ParseErrorKind, text: &str, index: usize) -> Self {
        let index = index.min(text.len());
        let mut line = 1;
        let mut column = 1;
        for (offset, ch) in text.char_indices() {
            if offset >= index {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        let found = text.get(index..).and_then(|rest| rest.chars().next());
        Self {
            kind,
            line,
            column,
            index,
            found,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(ch) => write!(
                f,
                "{} at line {}, column {} (index {}, found {:?})",
                self.kind, self.line, self.column, self.index, ch
            ),
            None => write!(
                f,
                "{} at line {}, column {} (index {}, end of input)",
                self.kind, self.line, self.column, self.index
            ),
        }
    }
}

/// Errors returned by stagejson operations.
///
/// Every failure is terminal for the call that raised it and propagates to the
/// top-level entry point; there is no partial result.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Malformed JSON text.
    Parse(ParseError),

    // ========================================================================
    // Conversion Errors
    // ========================================================================
    /// A typed read or write that has no defined conversion.
    TypeMismatch {
        expected: &'static str,
        found: BasicType,
    },
    /// Nesting went past the configured maximum depth.
    DepthExceeded { max_depth: usize },

    // ========================================================================
    // Member Errors
    // ========================================================================
    /// Unknown key while decoding in strict member mode.
    MissingMember { type_name: &'static str, member: String },
    /// Member exists but cannot be read or written under the active policy.
    Access {
        type_name: &'static str,
        member: &'static str,
        access: AccessKind,
    },

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// No strategy can be resolved for the runtime shape.
    UnsupportedShape { type_name: String, reason: String },

    // ========================================================================
    // Environment Errors
    // ========================================================================
    /// Output sink failure.
    Io(std::io::Error),
    /// Options profile could not be loaded.
    Config(String),
}

impl Error {
    pub(crate) fn mismatch(expected: &'static str, found: BasicType) -> Self {
        Error::TypeMismatch { expected, found }
    }

    pub(crate) fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnsupportedShape {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Parse failure details, if this is a parse error.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "Parse error: {}", e),
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Error::DepthExceeded { max_depth } => {
                write!(f, "Depth exceeded: nesting deeper than {}", max_depth)
            }
            Error::MissingMember { type_name, member } => {
                write!(f, "Missing member: {} has no member '{}'", type_name, member)
            }
            Error::Access {
                type_name,
                member,
                access,
            } => write!(
                f,
                "Access denied: cannot {} member '{}' of {}",
                access, member, type_name
            ),
            Error::UnsupportedShape { type_name, reason } => {
                write!(f, "Unsupported shape {}: {}", type_name, reason)
            }
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Convenient alias for results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_counts_lines_and_columns() {
        let text = "{\n  \"a\": x\n}";
        let index = text.find('x').expect("x present");
        let err = ParseError::locate(ParseErrorKind::UnexpectedChar, text, index);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 8);
        assert_eq!(err.index, index);
        assert_eq!(err.found, Some('x'));
    }

    #[test]
    fn test_locate_end_of_input() {
        let err = ParseError::locate(ParseErrorKind::UnexpectedEnd, "[1,", 3);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 4);
        assert_eq!(err.found, None);
        assert!(err.to_string().contains("end of input"));
    }

    #[test]
    fn test_error_display_variants() {
        let err = Error::mismatch("i32", BasicType::Array);
        assert_eq!(err.to_string(), "Type mismatch: expected i32, found array");

        let err = Error::DepthExceeded { max_depth: 4 };
        assert_eq!(err.to_string(), "Depth exceeded: nesting deeper than 4");

        let err = Error::Access {
            type_name: "Point",
            member: "x",
            access: AccessKind::Write,
        };
        assert_eq!(
            err.to_string(),
            "Access denied: cannot write member 'x' of Point"
        );
    }
}
