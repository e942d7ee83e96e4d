//! Recursive-descent parser.
//!
//! Precedence, lowest first:
//!
//! ```text
//! sum     := product (("+" | "-") product)*
//! product := unary (("*" | "/" | "//" | "%") unary)*
//! unary   := ("+" | "-") unary | power
//! power   := primary ("**" unary)?
//! primary := number | name | name "(" [sum ("," sum)* [","]] ")" | "(" sum ")"
//! ```

use crate::builtins::{Function, constant};
use crate::error::EvalError;
use crate::lexer::{Token, TokenKind, tokenize};

const MAX_DEPTH: usize = 64;

/// Upper bound on the number of tokens, which also bounds the height of
/// operator chains such as `1 + 1 + ... + 1`.
const MAX_TOKENS: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// The only shapes an expression can take. Constants are replaced by their
/// values and function names by [`Function`] while parsing.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Literal(f64),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

pub(crate) fn parse(input: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(input)?;
    if let Some(token) = tokens.get(MAX_TOKENS) {
        return Err(EvalError::syntax(
            token.position,
            "expression is too long",
        ));
    }
    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
        depth: 0,
        end: input.len(),
    };
    let expr = parser.parse_sum()?;
    if let Some(token) = parser.peek() {
        return Err(EvalError::syntax(
            token.position,
            format!("unexpected {}", token.kind),
        ));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    cursor: usize,
    depth: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    #[inline]
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.cursor)
    }

    #[inline]
    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    #[inline]
    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.cursor);
        self.cursor += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), EvalError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.cursor += 1;
                Ok(())
            }
            Some(token) => Err(EvalError::syntax(
                token.position,
                format!("expected {kind}, found {}", token.kind),
            )),
            None => Err(EvalError::syntax(
                self.end,
                format!("expected {kind}, found end of input"),
            )),
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let position = self.peek().map_or(self.end, |t| t.position);
            return Err(EvalError::syntax(
                position,
                "expression is nested too deeply",
            ));
        }
        Ok(())
    }

    fn parse_sum(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let mut lhs = self.parse_product()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.cursor += 1;
            let rhs = self.parse_product()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= 1;
        Ok(lhs)
    }

    fn parse_product(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::DoubleSlash) => BinaryOp::FloorDiv,
                Some(TokenKind::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.cursor += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.cursor += 1;
        self.enter()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let base = self.parse_primary()?;
        if self.peek_kind() != Some(&TokenKind::DoubleStar) {
            return Ok(base);
        }
        self.cursor += 1;
        self.enter()?;
        let exponent = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)))
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let end = self.end;
        let Some(token) = self.advance() else {
            return Err(EvalError::syntax(end, "unexpected end of input"));
        };
        match &token.kind {
            TokenKind::Number(value) => Ok(Expr::Literal(*value)),
            TokenKind::Ident(name) => {
                if self.peek_kind() != Some(&TokenKind::LParen) {
                    return constant(name)
                        .map(Expr::Literal)
                        .ok_or_else(|| EvalError::UnknownConstant(name.clone()));
                }
                let func = Function::from_name(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                self.cursor += 1;
                let args = self.parse_arguments()?;
                Ok(Expr::Call(func, args))
            }
            TokenKind::LParen => {
                let inner = self.parse_sum()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            kind => Err(EvalError::syntax(
                token.position,
                format!("unexpected {kind}"),
            )),
        }
    }

    /// Parses call arguments after the opening parenthesis.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        loop {
            if self.peek_kind() == Some(&TokenKind::RParen) {
                self.cursor += 1;
                return Ok(args);
            }
            args.push(self.parse_sum()?);
            match self.peek_kind() {
                Some(TokenKind::Comma) => self.cursor += 1,
                _ => {
                    self.expect(TokenKind::RParen)?;
                    return Ok(args);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: f64) -> Box<Expr> {
        Box::new(Expr::Literal(value))
    }

    #[test]
    fn test_precedence_shape() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                lit(1.0),
                Box::new(Expr::Binary(BinaryOp::Mul, lit(2.0), lit(3.0))),
            )
        );
        assert_eq!(
            parse("-2 ** 2").unwrap(),
            Expr::Unary(
                UnaryOp::Neg,
                Box::new(Expr::Binary(BinaryOp::Pow, lit(2.0), lit(2.0))),
            )
        );
    }

    #[test]
    fn test_calls() {
        assert_eq!(
            parse("gcd(4, 6,)").unwrap(),
            Expr::Call(
                Function::Gcd,
                vec![Expr::Literal(4.0), Expr::Literal(6.0)]
            )
        );
        assert_eq!(parse("gcd()").unwrap(), Expr::Call(Function::Gcd, vec![]));
        assert!(parse("abs(1 2)").is_err());
        assert!(parse("abs(,)").is_err());
    }

    #[test]
    fn test_names_resolve_while_parsing() {
        assert_eq!(parse("tau").unwrap(), Expr::Literal(std::f64::consts::TAU));
        assert_eq!(
            parse("foo + 1").unwrap_err(),
            EvalError::UnknownConstant("foo".to_owned())
        );
        // The unknown name is reported before its arguments are looked at.
        assert_eq!(
            parse("nope(1 2)").unwrap_err(),
            EvalError::UnknownFunction("nope".to_owned())
        );
        assert_eq!(
            parse("abs(foo)").unwrap_err(),
            EvalError::UnknownConstant("foo".to_owned())
        );
    }

    #[test]
    fn test_unbalanced() {
        let err = parse("(1 + 2").unwrap_err();
        assert_eq!(
            err,
            EvalError::syntax(6, "expected `)`, found end of input")
        );
        assert!(parse("1 + 2)").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(matches!(parse(&deep), Err(EvalError::Syntax { .. })));
        let deep_unary = format!("{}1", "-".repeat(500));
        assert!(matches!(parse(&deep_unary), Err(EvalError::Syntax { .. })));
        assert!(parse(&format!("{}1{}", "(".repeat(20), ")".repeat(20))).is_ok());
    }

    #[test]
    fn test_token_limit() {
        // 512 terms and 511 operators fit exactly.
        let chain = format!("1{}", "+1".repeat(511));
        assert!(parse(&chain).is_ok());
        let chain = format!("1{}", "+1".repeat(512));
        assert_eq!(
            parse(&chain).unwrap_err(),
            EvalError::syntax(1024, "expression is too long")
        );
    }
}
