//! A closed arithmetic interpreter for untrusted input.
//!
//! The evaluator accepts numbers, a fixed set of named constants, the
//! operators `+ - * / // % **` (and unary `+ -`), parentheses and calls to a
//! fixed set of math functions. Everything else is rejected with a typed
//! [`EvalError`], so the input string can never reach anything beyond plain
//! arithmetic.
//!
//! ```
//! use react_loop_expr::evaluate;
//!
//! assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
//! assert_eq!(evaluate("sqrt(16)").unwrap(), 4.0);
//! assert!((evaluate("pi * 2 ** 2").unwrap() - 12.566).abs() < 1e-3);
//! ```

#![deny(missing_docs)]

mod builtins;
mod error;
mod eval;
mod lexer;
mod parser;

pub use builtins::{CONSTANT_NAMES, FUNCTION_NAMES};
pub use error::{EvalError, EvalErrorKind};

/// Parses and evaluates an arithmetic expression.
///
/// The whole input must form exactly one expression. Integer and
/// floating-point literals are both accepted, and the result is always an
/// `f64`.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(EvalError::Empty);
    }
    let ast = parser::parse(expression)?;
    eval::eval(&ast)
}

/// Formats a number the way the calculator reports results.
///
/// Integral values keep one decimal place (`547.0`), other values use the
/// shortest representation that round-trips.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if value.abs() >= 1e16 {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => {
                format!("{mantissa}e+{exp}")
            }
            _ => formatted,
        };
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
