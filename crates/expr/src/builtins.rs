use std::f64::consts;

use crate::error::EvalError;

/// Names accepted as constants.
pub const CONSTANT_NAMES: &[&str] = &["pi", "e", "tau", "inf"];

/// Names accepted as functions.
pub const FUNCTION_NAMES: &[&str] = &[
    "sqrt",
    "sin",
    "cos",
    "tan",
    "asin",
    "acos",
    "atan",
    "log",
    "log10",
    "log2",
    "exp",
    "abs",
    "round",
    "floor",
    "ceil",
    "factorial",
    "gcd",
];

pub(crate) fn constant(name: &str) -> Option<f64> {
    let value = match name {
        "pi" => consts::PI,
        "e" => consts::E,
        "tau" => consts::TAU,
        "inf" => f64::INFINITY,
        _ => return None,
    };
    Some(value)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Function {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Log,
    Log10,
    Log2,
    Exp,
    Abs,
    Round,
    Floor,
    Ceil,
    Factorial,
    Gcd,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "sqrt" => Function::Sqrt,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "log" => Function::Log,
            "log10" => Function::Log10,
            "log2" => Function::Log2,
            "exp" => Function::Exp,
            "abs" => Function::Abs,
            "round" => Function::Round,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "factorial" => Function::Factorial,
            "gcd" => Function::Gcd,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Log => "log",
            Function::Log10 => "log10",
            Function::Log2 => "log2",
            Function::Exp => "exp",
            Function::Abs => "abs",
            Function::Round => "round",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Factorial => "factorial",
            Function::Gcd => "gcd",
        }
    }

    pub fn apply(self, args: &[f64]) -> Result<f64, EvalError> {
        match self {
            Function::Sqrt => {
                let x = self.one(args)?;
                if x < 0.0 {
                    return Err(self.domain_error());
                }
                Ok(x.sqrt())
            }
            Function::Sin => self.periodic(args, f64::sin),
            Function::Cos => self.periodic(args, f64::cos),
            Function::Tan => self.periodic(args, f64::tan),
            Function::Asin | Function::Acos => {
                let x = self.one(args)?;
                if !(-1.0..=1.0).contains(&x) {
                    return Err(self.domain_error());
                }
                Ok(if self == Function::Asin { x.asin() } else { x.acos() })
            }
            Function::Atan => Ok(self.one(args)?.atan()),
            Function::Log => {
                let (x, base) = self.one_or_two(args)?;
                if x <= 0.0 {
                    return Err(self.domain_error());
                }
                match base {
                    None => Ok(x.ln()),
                    Some(base) if base <= 0.0 => Err(self.domain_error()),
                    Some(base) if base == 1.0 => {
                        Err(EvalError::domain("division by zero"))
                    }
                    Some(base) => Ok(x.ln() / base.ln()),
                }
            }
            Function::Log10 | Function::Log2 => {
                let x = self.one(args)?;
                if x <= 0.0 {
                    return Err(self.domain_error());
                }
                Ok(if self == Function::Log10 { x.log10() } else { x.log2() })
            }
            Function::Exp => {
                let x = self.one(args)?;
                let value = x.exp();
                if value.is_infinite() && x.is_finite() {
                    return Err(EvalError::domain("math range error"));
                }
                Ok(value)
            }
            Function::Abs => Ok(self.one(args)?.abs()),
            Function::Round => {
                let (x, ndigits) = self.one_or_two(args)?;
                match ndigits {
                    None => {
                        if !x.is_finite() {
                            return Err(EvalError::domain(
                                "cannot round a non-finite value",
                            ));
                        }
                        Ok(x.round_ties_even())
                    }
                    Some(ndigits) => {
                        let ndigits = integral(self, ndigits)?;
                        if !x.is_finite() {
                            return Ok(x);
                        }
                        let scale = 10f64.powi(ndigits.clamp(-308.0, 308.0) as i32);
                        let scaled = x * scale;
                        // Past 2^52 every f64 is integral, so `x` already
                        // has no more digits to round away.
                        if !scaled.is_finite() || scaled.abs() >= 4_503_599_627_370_496.0 {
                            return Ok(x);
                        }
                        Ok(scaled.round_ties_even() / scale)
                    }
                }
            }
            Function::Floor | Function::Ceil => {
                let x = self.one(args)?;
                if !x.is_finite() {
                    return Err(EvalError::domain(format!(
                        "{}() of a non-finite value",
                        self.name()
                    )));
                }
                Ok(if self == Function::Floor { x.floor() } else { x.ceil() })
            }
            Function::Factorial => {
                let n = integral(self, self.one(args)?)?;
                if n < 0.0 {
                    return Err(EvalError::domain(
                        "factorial() not defined for negative values",
                    ));
                }
                // 171! no longer fits into an f64.
                if n > 170.0 {
                    return Err(EvalError::domain("factorial() result too large"));
                }
                Ok((2..=n as u32).fold(1.0, |acc, k| acc * f64::from(k)))
            }
            Function::Gcd => {
                let mut acc = 0.0_f64;
                for &arg in args {
                    let mut b = integral(self, arg)?.abs();
                    let mut a = acc;
                    while b != 0.0 {
                        (a, b) = (b, a % b);
                    }
                    acc = a;
                }
                Ok(acc)
            }
        }
    }

    fn one(self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            [x] => Ok(*x),
            _ => Err(EvalError::Arity {
                function: self.name(),
                message: format!(
                    "takes exactly one argument ({} given)",
                    args.len()
                ),
            }),
        }
    }

    fn one_or_two(self, args: &[f64]) -> Result<(f64, Option<f64>), EvalError> {
        match args {
            [x] => Ok((*x, None)),
            [x, y] => Ok((*x, Some(*y))),
            _ => Err(EvalError::Arity {
                function: self.name(),
                message: format!(
                    "expected 1 or 2 arguments, got {}",
                    args.len()
                ),
            }),
        }
    }

    fn periodic(
        self,
        args: &[f64],
        f: fn(f64) -> f64,
    ) -> Result<f64, EvalError> {
        let x = self.one(args)?;
        if x.is_infinite() {
            return Err(self.domain_error());
        }
        Ok(f(x))
    }

    #[inline]
    fn domain_error(self) -> EvalError {
        EvalError::domain(format!("math domain error in {}()", self.name()))
    }
}

fn integral(func: Function, value: f64) -> Result<f64, EvalError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(EvalError::domain(format!(
            "{}() only accepts integral values",
            func.name()
        )));
    }
    Ok(value)
}
