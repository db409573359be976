use std::fmt;

use crate::native::NativeError;

/// Everything a bn primitive can report back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// operand of an unsupported kind, `argument` is 1-based
    Type {
        argument: usize,
        expected: &'static str,
        got: &'static str,
    },
    Parse {
        literal: String,
    },
    /// failure return of the arithmetic library
    Arithmetic {
        operation: String,
        code: u32,
        reason: Option<&'static str>,
    },
    Allocation {
        what: &'static str,
    },
    Internal {
        message: String,
    },
}

impl Error {
    pub fn type_error(
        argument: usize,
        expected: &'static str,
        got: &'static str,
    ) -> Self {
        Error::Type {
            argument,
            expected,
            got,
        }
    }

    pub fn parse(literal: &str) -> Self {
        Error::Parse {
            literal: literal.to_string(),
        }
    }

    pub fn native(operation: &str, err: NativeError) -> Self {
        Error::Arithmetic {
            operation: operation.to_string(),
            code: err.code(),
            reason: err.reason(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    pub fn is_division_by_zero(&self) -> bool {
        matches!(
            self,
            Error::Arithmetic { code, .. }
                if *code == NativeError::DivisionByZero.code()
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Type {
                argument,
                expected,
                got,
            } => write!(
                f,
                "bad argument #{argument} ({expected} expected, got {got})"
            ),
            Error::Parse { literal } => {
                write!(f, "unable to parse bn.number from '{literal}'")
            }
            Error::Arithmetic {
                operation,
                reason: Some(reason),
                ..
            } => write!(f, "{operation}: {reason}"),
            Error::Arithmetic {
                operation,
                code,
                reason: None,
            } => write!(f, "{operation}: strings not loaded, code {code}"),
            Error::Allocation { what } => write!(f, "not enough memory: {what}"),
            Error::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for Error {}
