//! Arithmetic expression tokenizer, parser and evaluator
//!
//! Operates on a closed token set: numbers, `+ - × ÷ ^`, parentheses and
//! unary minus. Precedence from loosest to tightest:
//!
//! | Level | Operators | Associativity |
//! |---|---|---|
//! | 1 | `+ -` | left |
//! | 2 | `× ÷` | left |
//! | 3 | unary `-` | prefix |
//! | 4 | `^` | right |
//!
//! So `-2^2 = -4` and `2^3^2 = 512`.

use crate::error::CalcError;
use crate::key::Operator;

/// Lexical token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Op(Operator),
    LParen,
    RParen,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Negate(Box<Expr>),
    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

const UNARY_PRECEDENCE: u8 = 3;

impl Operator {
    fn precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Subtract => 1,
            Operator::Multiply | Operator::Divide => 2,
            Operator::Power => 4,
        }
    }

    fn is_right_assoc(&self) -> bool {
        matches!(self, Operator::Power)
    }

    /// Applies the operator to two operands
    pub fn apply(&self, lhs: f64, rhs: f64) -> Result<f64, CalcError> {
        let value = match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
            Operator::Divide => {
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                lhs / rhs
            }
            Operator::Power => {
                let value = lhs.powf(rhs);
                if value.is_nan() {
                    return Err(CalcError::domain("fractional power of a negative number"));
                }
                value
            }
        };
        finite(value)
    }
}

fn finite(value: f64) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::Range)
    }
}

/// Splits text into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch.is_ascii_digit() || ch == '.' {
            let mut literal = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    literal.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            let value = literal
                .parse::<f64>()
                .map_err(|_| CalcError::parse(format!("malformed number '{}'", literal)))?;
            tokens.push(Token::Number(value));
        } else if ch == '(' {
            tokens.push(Token::LParen);
            chars.next();
        } else if ch == ')' {
            tokens.push(Token::RParen);
            chars.next();
        } else if let Some(op) = Operator::from_char(ch) {
            tokens.push(Token::Op(op));
            chars.next();
        } else {
            return Err(CalcError::parse(format!("unexpected character '{}'", ch)));
        }
    }

    Ok(tokens)
}

/// Inserts implicit multiplication and closes open parentheses
///
/// `2(3)` becomes `2×(3)`, `)(` becomes `)×(` and `)2` becomes `)×2`.
pub fn normalize(tokens: Vec<Token>) -> Result<Vec<Token>, CalcError> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len() + 2);
    let mut depth: usize = 0;

    for token in tokens {
        let prev_closes_operand = matches!(out.last(), Some(Token::Number(_) | Token::RParen));
        let starts_operand = matches!(token, Token::Number(_) | Token::LParen);
        if prev_closes_operand && starts_operand {
            out.push(Token::Op(Operator::Multiply));
        }

        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| CalcError::parse("unmatched ')'"))?;
            }
            _ => {}
        }
        out.push(token);
    }

    out.extend(std::iter::repeat(Token::RParen).take(depth));
    Ok(out)
}

/// Precedence-climbing parser over a token slice
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse(mut self) -> Result<Expr, CalcError> {
        if self.tokens.is_empty() {
            return Err(CalcError::parse("empty expression"));
        }
        let expr = self.parse_binary(1)?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(CalcError::parse(format!("unexpected token {:?}", token))),
        }
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, CalcError> {
        let mut lhs = self.parse_unary()?;

        while let Some(Token::Op(op)) = self.peek() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let next_min = if op.is_right_assoc() {
                precedence
            } else {
                precedence + 1
            };
            let rhs = self.parse_binary(next_min)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CalcError> {
        match self.peek() {
            Some(Token::Op(Operator::Subtract)) => {
                self.advance();
                let operand = self.parse_binary(UNARY_PRECEDENCE)?;
                Ok(Expr::Negate(Box::new(operand)))
            }
            Some(Token::Op(Operator::Add)) => {
                self.advance();
                self.parse_binary(UNARY_PRECEDENCE)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CalcError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.parse_binary(1)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(CalcError::parse("expected ')'")),
                }
            }
            Some(token) => Err(CalcError::parse(format!("missing operand before {:?}", token))),
            None => Err(CalcError::parse("missing operand")),
        }
    }
}

/// Parses a token stream into an expression tree
pub fn parse(tokens: &[Token]) -> Result<Expr, CalcError> {
    Parser::new(tokens).parse()
}

impl Expr {
    pub fn eval(&self) -> Result<f64, CalcError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Negate(inner) => Ok(-inner.eval()?),
            Expr::Binary { op, lhs, rhs } => op.apply(lhs.eval()?, rhs.eval()?),
        }
    }
}

/// Tokenizes, normalizes, parses and evaluates `input`
pub fn evaluate(input: &str) -> Result<f64, CalcError> {
    let tokens = normalize(tokenize(input)?)?;
    let value = parse(&tokens)?.eval()?;
    finite(value)
}

/// Trailing `<binary op> <number>` pair, remembered for repeat-on-equals
pub fn trailing_operation(input: &str) -> Option<(Operator, f64)> {
    let tokens = tokenize(input).ok()?;
    match tokens.as_slice() {
        [.., Token::Number(_) | Token::RParen, Token::Op(op), Token::Number(operand)] => {
            Some((*op, *operand))
        }
        _ => None,
    }
}

/// Real `degree`-th root of `radicand`
pub fn nth_root(radicand: f64, degree: f64) -> Result<f64, CalcError> {
    if degree == 0.0 {
        return Err(CalcError::domain("root of degree zero"));
    }
    if radicand < 0.0 {
        let odd_integer = degree.fract() == 0.0 && degree % 2.0 != 0.0;
        if !odd_integer {
            return Err(CalcError::domain("even root of a negative number"));
        }
        return finite(-(-radicand).powf(1.0 / degree));
    }
    finite(radicand.powf(1.0 / degree))
}
