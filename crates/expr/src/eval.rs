use crate::error::EvalError;
use crate::parser::{BinaryOp, Expr, UnaryOp};

pub(crate) fn eval(expr: &Expr) -> Result<f64, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(*value),
        Expr::Unary(op, operand) => {
            let value = eval(operand)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Pos => value,
            })
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs)?;
            let rhs = eval(rhs)?;
            binary(*op, lhs, rhs)
        }
        Expr::Call(func, args) => {
            let args = args.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            func.apply(&args)
        }
    }
}

fn binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(lhs + rhs),
        BinaryOp::Sub => Ok(lhs - rhs),
        BinaryOp::Mul => Ok(lhs * rhs),
        BinaryOp::Div => {
            check_divisor(rhs)?;
            Ok(lhs / rhs)
        }
        BinaryOp::FloorDiv => {
            check_divisor(rhs)?;
            Ok((lhs / rhs).floor())
        }
        BinaryOp::Mod => {
            check_divisor(rhs)?;
            // The result takes the sign of the divisor.
            let rem = lhs % rhs;
            if rem != 0.0 && (rem < 0.0) != (rhs < 0.0) {
                Ok(rem + rhs)
            } else {
                Ok(rem)
            }
        }
        BinaryOp::Pow => power(lhs, rhs),
    }
}

#[inline]
fn check_divisor(rhs: f64) -> Result<(), EvalError> {
    if rhs == 0.0 {
        return Err(EvalError::domain("division by zero"));
    }
    Ok(())
}

fn power(base: f64, exponent: f64) -> Result<f64, EvalError> {
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::domain(
            "zero cannot be raised to a negative power",
        ));
    }
    if base < 0.0 && exponent.is_finite() && exponent.fract() != 0.0 {
        return Err(EvalError::domain(
            "negative number cannot be raised to a fractional power",
        ));
    }
    let value = base.powf(exponent);
    if value.is_infinite() && base.is_finite() && exponent.is_finite() {
        return Err(EvalError::domain("numerical result out of range"));
    }
    Ok(value)
}
