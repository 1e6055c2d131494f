//! Deterministic arithmetic for math-routed queries.
//!
//! A small recursive-descent evaluator over `+ - * / % ^`, parentheses,
//! unary minus and decimal literals. `^` is right-associative and binds
//! tighter than unary minus, so `-2^2 == -4`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Longest run of characters that can belong to an arithmetic expression.
static EXPRESSION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\d.\s()+\-*/%^×÷]+").ok());

/// Deepest nesting of parentheses, signs and exponents the parser follows.
pub const MAX_DEPTH: usize = 64;

/// Words allowed around an expression for the query to count as pure math.
const FILLER_WORDS: &[&str] = &[
    "what", "whats", "what's", "is", "calculate", "compute", "evaluate", "solve", "the", "value",
    "of", "equals", "equal", "result", "please", "how", "much",
];

/// Errors raised while evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// The input ended before the expression was complete.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A character or token was not expected at this position.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// Offending token.
        token: String,
        /// Character offset.
        position: usize,
    },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Parentheses, signs or exponents nested past [`MAX_DEPTH`].
    #[error("expression nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,

    /// The result is not a finite number.
    #[error("result is not a finite number")]
    NonFinite,
}

/// Extracts a pure arithmetic expression from a query.
///
/// Returns `None` unless the query is an expression wrapped only in filler
/// words ("what is", "calculate", ...) and the expression contains at least
/// one operator and one digit.
#[must_use]
pub fn extract_expression(query: &str) -> Option<String> {
    let candidate = EXPRESSION_RE
        .as_ref()?
        .find_iter(query)
        .map(|m| m.as_str().trim())
        .filter(|s| s.chars().any(|c| c.is_ascii_digit()))
        .max_by_key(|s| s.len())?;

    let has_operator = candidate
        .chars()
        .any(|c| matches!(c, '+' | '-' | '*' | '/' | '%' | '^' | '×' | '÷'));
    if !has_operator {
        return None;
    }

    let remainder = query.replacen(candidate, " ", 1);
    let only_filler = remainder
        .split(|c: char| c.is_whitespace() || matches!(c, '?' | '=' | ',' | ':' | '!'))
        .filter(|w| !w.is_empty())
        .all(|w| {
            let word = w.to_lowercase();
            FILLER_WORDS.contains(&word.as_str())
        });

    only_filler.then(|| candidate.to_string())
}

/// Evaluates an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens: Vec<(usize, char)> = expression
        .chars()
        .enumerate()
        .map(|(i, c)| match c {
            '×' => (i, '*'),
            '÷' => (i, '/'),
            other => (i, other),
        })
        .collect();

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;

    parser.skip_whitespace();
    if let Some(&(position, c)) = parser.tokens.get(parser.pos) {
        return Err(CalcError::UnexpectedToken {
            token: c.to_string(),
            position,
        });
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NonFinite)
    }
}

/// Formats a result: integers without a fractional part, other values with
/// up to ten decimals and trailing zeros removed.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{:.0}", value + 0.0);
    }
    let formatted = format!("{value:.10}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Whitespace separates tokens but is never skipped inside a literal.
struct Parser {
    tokens: Vec<(usize, char)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn skip_whitespace(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|&(_, c)| c.is_whitespace())
        {
            self.pos += 1;
        }
    }

    /// Next non-whitespace character.
    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.tokens.get(self.pos).map(|&(_, c)| c)
    }

    fn unexpected(&mut self) -> CalcError {
        self.skip_whitespace();
        match self.tokens.get(self.pos) {
            Some(&(position, c)) => CalcError::UnexpectedToken {
                token: c.to_string(),
                position,
            },
            None => CalcError::UnexpectedEnd,
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ ('*' | '/' | '%')) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    // unary := ('-' | '+') unary | power
    //
    // Every recursive path passes through here, so this is where nesting
    // depth is bounded.
    fn unary(&mut self) -> Result<f64, CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some('+') => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some('^') {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.expression()?;
                if self.peek() == Some(')') {
                    self.pos += 1;
                    Ok(value)
                } else {
                    Err(self.unexpected())
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            _ => Err(self.unexpected()),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        let mut literal = String::new();
        while let Some(&(_, c)) = self.tokens.get(self.pos) {
            if c.is_ascii_digit() || c == '.' {
                literal.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        literal.parse::<f64>().map_err(|_| CalcError::UnexpectedToken {
            token: literal.clone(),
            position: self.tokens.get(start).map_or(0, |&(p, _)| p),
        })
    }
}
