//! Arithmetic expression evaluator for the `calculate` tool
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := '-' unary | power
//! power   := primary ('^' unary)?        right-associative
//! primary := number | '(' expr ')'
//! ```
//!
//! `-2^2` is `-(2^2)`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result is not a finite number")]
    NotFinite,

    #[error("Expression is empty")]
    Empty,
}

impl CalcError {
    /// Whether the expression itself was malformed (as opposed to undefined)
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            CalcError::UnexpectedChar(..)
                | CalcError::UnexpectedEnd
                | CalcError::InvalidNumber(_)
                | CalcError::Empty
        )
    }
}

pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut parser = Parser { chars, pos: 0 };

    parser.skip_whitespace();
    if parser.peek().is_none() {
        return Err(CalcError::Empty);
    }

    let value = parser.expr()?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(CalcError::UnexpectedChar(c, parser.pos));
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Consume `op` if it is the next non-space character
    fn eat(&mut self, op: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value /= rhs;
            } else if self.eat('%') {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value %= rhs;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.eat('-') {
            return Ok(-self.unary()?);
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.eat('^') {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(CalcError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.eat(')') {
                    Ok(value)
                } else {
                    match self.peek() {
                        Some(c) => Err(CalcError::UnexpectedChar(c, self.pos)),
                        None => Err(CalcError::UnexpectedEnd),
                    }
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(CalcError::UnexpectedChar(c, self.pos)),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse()
            .map_err(|_| CalcError::InvalidNumber(literal))
    }
}
