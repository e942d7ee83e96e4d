use std::fmt::{self, Display, Formatter};

use crate::error::EvalError;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    Comma,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(value) => write!(f, "number {value}"),
            TokenKind::Ident(name) => write!(f, "name `{name}`"),
            TokenKind::Plus => write!(f, "`+`"),
            TokenKind::Minus => write!(f, "`-`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::DoubleStar => write!(f, "`**`"),
            TokenKind::Slash => write!(f, "`/`"),
            TokenKind::DoubleSlash => write!(f, "`//`"),
            TokenKind::Percent => write!(f, "`%`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::Comma => write!(f, "`,`"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut idx = 0;

    while idx < bytes.len() {
        let start = idx;
        let ch = bytes[idx];

        if ch.is_ascii_whitespace() {
            idx += 1;
            continue;
        }

        if ch.is_ascii_digit() || ch == b'.' {
            let (value, end) = lex_number(input, start)?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                position: start,
            });
            idx = end;
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == b'_' {
            while idx < bytes.len()
                && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_')
            {
                idx += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(input[start..idx].to_owned()),
                position: start,
            });
            continue;
        }

        let next = bytes.get(idx + 1).copied();
        let (kind, len) = match (ch, next) {
            (b'*', Some(b'*')) => (TokenKind::DoubleStar, 2),
            (b'/', Some(b'/')) => (TokenKind::DoubleSlash, 2),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'%', _) => (TokenKind::Percent, 1),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b',', _) => (TokenKind::Comma, 1),
            _ => {
                // Report the whole character, not a single UTF-8 byte.
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(EvalError::syntax(
                    start,
                    format!("unexpected character `{ch}`"),
                ));
            }
        };
        tokens.push(Token {
            kind,
            position: start,
        });
        idx += len;
    }

    Ok(tokens)
}

/// Lexes `digits [. digits] [(e|E) [+|-] digits]`, where either side of the
/// dot may be empty but not both.
fn lex_number(input: &str, start: usize) -> Result<(f64, usize), EvalError> {
    let bytes = input.as_bytes();
    let mut idx = start;
    let skip_digits = |mut idx: usize| {
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        idx
    };

    idx = skip_digits(idx);
    let mut has_digits = idx > start;
    if idx < bytes.len() && bytes[idx] == b'.' {
        let frac_start = idx + 1;
        idx = skip_digits(frac_start);
        has_digits |= idx > frac_start;
    }
    if !has_digits {
        return Err(EvalError::syntax(start, "invalid number literal"));
    }

    if idx < bytes.len() && (bytes[idx] == b'e' || bytes[idx] == b'E') {
        let mut exp_idx = idx + 1;
        if exp_idx < bytes.len()
            && (bytes[exp_idx] == b'+' || bytes[exp_idx] == b'-')
        {
            exp_idx += 1;
        }
        let exp_end = skip_digits(exp_idx);
        if exp_end == exp_idx {
            return Err(EvalError::syntax(start, "invalid number literal"));
        }
        idx = exp_end;
    }

    let literal = &input[start..idx];
    let value = literal
        .parse::<f64>()
        .map_err(|_| EvalError::syntax(start, "invalid number literal"))?;
    Ok((value, idx))
}
