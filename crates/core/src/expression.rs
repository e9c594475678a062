use std::fmt;

use serde::Serialize;

use crate::error::ExpressionError;

pub const MAX_EXPRESSION_LEN: usize = 4_096;
pub const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' => Some(Self::Mul),
            '/' => Some(Self::Div),
            '^' => Some(Self::Pow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpressionToken {
    Number(Number),
    Operator(Operator),
    LParen,
    RParen,
}

/// Result of an evaluation: exact while the arithmetic stays integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    /// The integral value, for ints and for floats with no fractional part.
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Number::Int(value) => Some(value),
            Number::Float(value)
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 =>
            {
                Some(value as i64)
            }
            Number::Float(_) => None,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{value}"),
            Number::Float(value) if value.fract() == 0.0 => write!(f, "{value:.1}"),
            Number::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Whitelist check: digits, `+ - * / ^ ( ) .` and whitespace, nothing else.
pub fn is_safe(expression: &str) -> bool {
    first_unsafe_char(expression).is_none() && !expression.is_empty()
}

fn first_unsafe_char(expression: &str) -> Option<(usize, char)> {
    expression.char_indices().find(|(_, ch)| {
        !(ch.is_ascii_digit() || ch.is_whitespace() || "+-*/^().".contains(*ch))
    })
}

/// Evaluates a restricted arithmetic expression. Always re-validates its input.
pub fn evaluate(expression: &str) -> Result<Number, ExpressionError> {
    if let Some((position, character)) = first_unsafe_char(expression) {
        return Err(ExpressionError::UnsafeExpression {
            character,
            position,
        });
    }
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(ExpressionError::malformed(format!(
            "expression longer than {MAX_EXPRESSION_LEN} bytes"
        )));
    }

    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ExpressionError::malformed("empty expression"));
    }

    let mut parser = Parser {
        tokens: &tokens,
        position: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    match parser.peek() {
        None => Ok(value),
        Some(ExpressionToken::RParen) => Err(ExpressionError::malformed("unmatched ')'")),
        Some(_) => Err(ExpressionError::malformed("missing operator between operands")),
    }
}

pub fn tokenize(expression: &str) -> Result<Vec<ExpressionToken>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch.is_ascii_digit() || ch == '.' {
            let mut end = start;
            while let Some(&(index, next)) = chars.peek() {
                if next.is_ascii_digit() || next == '.' {
                    end = index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(ExpressionToken::Number(parse_number(&expression[start..end])?));
        } else if let Some(operator) = Operator::from_char(ch) {
            tokens.push(ExpressionToken::Operator(operator));
            chars.next();
        } else if ch == '(' {
            tokens.push(ExpressionToken::LParen);
            chars.next();
        } else if ch == ')' {
            tokens.push(ExpressionToken::RParen);
            chars.next();
        } else {
            return Err(ExpressionError::UnsafeExpression {
                character: ch,
                position: start,
            });
        }
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> Result<Number, ExpressionError> {
    let dots = literal.matches('.').count();
    if dots > 1 || literal == "." {
        return Err(ExpressionError::malformed(format!("invalid number '{literal}'")));
    }
    if dots == 0 {
        if let Ok(value) = literal.parse::<i64>() {
            return Ok(Number::Int(value));
        }
    }
    let value = literal
        .parse::<f64>()
        .map_err(|_| ExpressionError::malformed(format!("invalid number '{literal}'")))?;
    check_finite(Number::Float(value))
}

/// Recursive descent over the grammar
///
/// ```text
/// expression := term (('+' | '-') term)*
/// term       := unary (('*' | '/') unary)*
/// unary      := '-' power | power
/// power      := primary ('^' unary)?
/// primary    := NUMBER | '(' expression ')'
/// ```
struct Parser<'a> {
    tokens: &'a [ExpressionToken],
    position: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<ExpressionToken> {
        self.tokens.get(self.position).copied()
    }

    fn next(&mut self) -> Option<ExpressionToken> {
        let token = self.peek();
        self.position += 1;
        token
    }

    fn expression(&mut self) -> Result<Number, ExpressionError> {
        let mut value = self.term()?;
        while let Some(ExpressionToken::Operator(operator @ (Operator::Add | Operator::Sub))) =
            self.peek()
        {
            self.position += 1;
            let rhs = self.term()?;
            value = apply(operator, value, rhs)?;
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<Number, ExpressionError> {
        let mut value = self.unary()?;
        while let Some(ExpressionToken::Operator(operator @ (Operator::Mul | Operator::Div))) =
            self.peek()
        {
            self.position += 1;
            let rhs = self.unary()?;
            value = apply(operator, value, rhs)?;
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<Number, ExpressionError> {
        if let Some(ExpressionToken::Operator(Operator::Sub)) = self.peek() {
            self.position += 1;
            let value = self.power()?;
            return negate(value);
        }
        self.power()
    }

    fn power(&mut self) -> Result<Number, ExpressionError> {
        let base = self.primary()?;
        if let Some(ExpressionToken::Operator(Operator::Pow)) = self.peek() {
            self.position += 1;
            self.enter()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return apply(Operator::Pow, base, exponent);
        }
        Ok(base)
    }

    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ExpressionError::malformed(format!(
                "expression nested deeper than {MAX_NESTING}"
            )));
        }
        Ok(())
    }

    fn primary(&mut self) -> Result<Number, ExpressionError> {
        match self.next() {
            Some(ExpressionToken::Number(value)) => Ok(value),
            Some(ExpressionToken::LParen) => {
                self.enter()?;
                let value = self.expression()?;
                match self.next() {
                    Some(ExpressionToken::RParen) => {
                        self.depth -= 1;
                        Ok(value)
                    }
                    _ => Err(ExpressionError::malformed("unmatched '('")),
                }
            }
            Some(ExpressionToken::RParen) => Err(ExpressionError::malformed(
                "operand missing before ')'",
            )),
            Some(ExpressionToken::Operator(_)) => Err(ExpressionError::malformed(
                "two consecutive operators",
            )),
            None => Err(ExpressionError::malformed("operator is missing an operand")),
        }
    }
}

fn negate(value: Number) -> Result<Number, ExpressionError> {
    let negated = match value {
        Number::Int(int) => exact(int.checked_neg(), -(int as f64)),
        Number::Float(float) => Number::Float(-float),
    };
    check_finite(negated)
}

fn apply(operator: Operator, lhs: Number, rhs: Number) -> Result<Number, ExpressionError> {
    let result = match (operator, lhs, rhs) {
        (Operator::Div, _, rhs) if rhs.is_zero() => return Err(ExpressionError::DivisionByZero),
        (Operator::Div, lhs, rhs) => Number::Float(lhs.as_f64() / rhs.as_f64()),
        (Operator::Add, Number::Int(a), Number::Int(b)) => exact(a.checked_add(b), a as f64 + b as f64),
        (Operator::Sub, Number::Int(a), Number::Int(b)) => exact(a.checked_sub(b), a as f64 - b as f64),
        (Operator::Mul, Number::Int(a), Number::Int(b)) => exact(a.checked_mul(b), a as f64 * b as f64),
        (Operator::Pow, Number::Int(a), Number::Int(b)) if b >= 0 => {
            let exact_pow = u32::try_from(b).ok().and_then(|b| a.checked_pow(b));
            exact(exact_pow, (a as f64).powf(b as f64))
        }
        (Operator::Pow, base, exponent) => {
            if base.is_zero() && exponent.as_f64() < 0.0 {
                return Err(ExpressionError::DivisionByZero);
            }
            Number::Float(base.as_f64().powf(exponent.as_f64()))
        }
        (Operator::Add, a, b) => Number::Float(a.as_f64() + b.as_f64()),
        (Operator::Sub, a, b) => Number::Float(a.as_f64() - b.as_f64()),
        (Operator::Mul, a, b) => Number::Float(a.as_f64() * b.as_f64()),
    };
    check_finite(result)
}

fn exact(value: Option<i64>, fallback: f64) -> Number {
    value.map(Number::Int).unwrap_or(Number::Float(fallback))
}

fn check_finite(value: Number) -> Result<Number, ExpressionError> {
    match value {
        Number::Float(float) if float.is_nan() => Err(ExpressionError::UndefinedResult),
        Number::Float(float) if float.is_infinite() => Err(ExpressionError::NumericOverflow),
        _ => Ok(value),
    }
}
