use thiserror::Error;

use crate::builtins::FUNCTION_NAMES;

/// The broad category of an [`EvalError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvalErrorKind {
    /// The input is empty or is not a single well-formed expression.
    Syntax,
    /// The input names a constant or function outside the whitelist.
    UnknownIdentifier,
    /// A function was called with the wrong number of arguments.
    Arity,
    /// The expression is well-formed but has no real value (division by
    /// zero, `sqrt(-1)`, overflow, ...).
    Domain,
}

/// An error produced while parsing or evaluating an expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The expression is empty or whitespace-only.
    #[error("expression must not be empty")]
    Empty,
    /// The expression could not be parsed.
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        /// Byte offset of the offending token.
        position: usize,
        /// What went wrong.
        message: String,
    },
    /// A bare name that is not a known constant.
    #[error("unknown constant `{0}`")]
    UnknownConstant(String),
    /// A call to a function that is not whitelisted.
    #[error("unknown function `{0}`, available: {available}", available = FUNCTION_NAMES.join(", "))]
    UnknownFunction(String),
    /// A whitelisted function rejected its argument count.
    #[error("{function}() {message}")]
    Arity {
        /// The called function.
        function: &'static str,
        /// Description of the mismatch.
        message: String,
    },
    /// Evaluation has no real result.
    #[error("{0}")]
    Domain(String),
}

impl EvalError {
    /// Returns the category of this error.
    #[inline]
    pub fn kind(&self) -> EvalErrorKind {
        match self {
            EvalError::Empty | EvalError::Syntax { .. } => EvalErrorKind::Syntax,
            EvalError::UnknownConstant(_) | EvalError::UnknownFunction(_) => {
                EvalErrorKind::UnknownIdentifier
            }
            EvalError::Arity { .. } => EvalErrorKind::Arity,
            EvalError::Domain(_) => EvalErrorKind::Domain,
        }
    }

    #[inline]
    pub(crate) fn syntax<S: Into<String>>(position: usize, message: S) -> Self {
        EvalError::Syntax {
            position,
            message: message.into(),
        }
    }

    #[inline]
    pub(crate) fn domain<S: Into<String>>(message: S) -> Self {
        EvalError::Domain(message.into())
    }
}
