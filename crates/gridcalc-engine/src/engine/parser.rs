//! Formula parser: turns expression text into a [`Formula`].
//!
//! Supports numbers, cell references (`A1`, `#REF!`), unary `+`/`-`, the four
//! arithmetic operators and parentheses. Cell references must be upper-case.

use thiserror::Error;

use super::formula::{BinaryOp, Expr, Formula, UnaryOp};
use super::position::Position;

/// Limit on parenthesis and unary-sign nesting. Operator runs are flat chains
/// and do not count.
const MAX_NESTING: usize = 512;

/// Formula text that could not be parsed.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the expression text.
    pub offset: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, offset: usize) -> ParseError {
        ParseError {
            message: message.into(),
            offset,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TokenKind {
    Number(f64),
    Cell(Position),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Clone, Copy, Debug)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

/// Parse an expression (the text after the formula's `=`).
pub fn parse_formula(expression: &str) -> Result<Formula, ParseError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ParseError::new("empty formula", expression.len()));
    }

    let referenced_cells = tokens
        .iter()
        .filter_map(|token| match token.kind {
            TokenKind::Cell(pos) => Some(pos),
            _ => None,
        })
        .collect();

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: expression.len(),
    };
    let expr = parser.parse_add_sub(0)?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::new("unexpected token", token.offset));
    }
    Ok(Formula::new(expr, referenced_cells))
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let kind = match bytes[i] {
            b' ' | b'\t' => {
                i += 1;
                continue;
            }
            b'+' => {
                i += 1;
                TokenKind::Plus
            }
            b'-' => {
                i += 1;
                TokenKind::Minus
            }
            b'*' => {
                i += 1;
                TokenKind::Star
            }
            b'/' => {
                i += 1;
                TokenKind::Slash
            }
            b'(' => {
                i += 1;
                TokenKind::LParen
            }
            b')' => {
                i += 1;
                TokenKind::RParen
            }
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, i);
                let text = &input[start..i];
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ParseError::new(format!("invalid number '{}'", text), start))?;
                if !n.is_finite() {
                    return Err(ParseError::new(format!("number out of range '{}'", text), start));
                }
                TokenKind::Number(n)
            }
            b'A'..=b'Z' => {
                while i < bytes.len() && bytes[i].is_ascii_uppercase() {
                    i += 1;
                }
                let letters_end = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i == letters_end {
                    return Err(ParseError::new("expected row number", letters_end));
                }
                // Well-formed but out of the grid: keep it as a dangling reference.
                TokenKind::Cell(Position::from_a1(&input[start..i]).unwrap_or(Position::NONE))
            }
            b'#' if input[i..].starts_with("#REF!") => {
                i += "#REF!".len();
                TokenKind::Cell(Position::NONE)
            }
            _ => {
                let ch = input[i..].chars().next().unwrap_or_default();
                return Err(ParseError::new(format!("unexpected character '{}'", ch), start));
            }
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
    }

    Ok(tokens)
}

/// Scan `digits [. digits] [e [+-] digits]`, returning the end offset.
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    end: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |token| token.offset)
    }

    fn check_nesting(&self, nesting: usize) -> Result<(), ParseError> {
        if nesting > MAX_NESTING {
            Err(ParseError::new("formula nested too deeply", self.offset()))
        } else {
            Ok(())
        }
    }

    /// Parse one precedence level as a flat chain of `operand (op operand)*`.
    fn parse_chain(
        &mut self,
        nesting: usize,
        operator: fn(TokenKind) -> Option<BinaryOp>,
        operand: fn(&mut Self, usize) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let first = operand(self, nesting)?;
        let mut rest = Vec::new();
        while let Some(op) = self.peek().and_then(|token| operator(token.kind)) {
            self.pos += 1;
            rest.push((op, operand(self, nesting)?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Chain {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_add_sub(&mut self, nesting: usize) -> Result<Expr, ParseError> {
        self.parse_chain(
            nesting,
            |kind| match kind {
                TokenKind::Plus => Some(BinaryOp::Add),
                TokenKind::Minus => Some(BinaryOp::Sub),
                _ => None,
            },
            Self::parse_mul_div,
        )
    }

    fn parse_mul_div(&mut self, nesting: usize) -> Result<Expr, ParseError> {
        self.parse_chain(
            nesting,
            |kind| match kind {
                TokenKind::Star => Some(BinaryOp::Mul),
                TokenKind::Slash => Some(BinaryOp::Div),
                _ => None,
            },
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self, nesting: usize) -> Result<Expr, ParseError> {
        self.check_nesting(nesting)?;
        let op = match self.peek().map(|token| token.kind) {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Minus,
            _ => return self.parse_primary(nesting),
        };
        self.pos += 1;
        let operand = self.parse_unary(nesting + 1)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self, nesting: usize) -> Result<Expr, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::new("unexpected end of formula", self.end));
        };
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Cell(pos) => Ok(Expr::Cell(pos)),
            TokenKind::LParen => {
                let inner = self.parse_add_sub(nesting + 1)?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(ParseError::new("expected ')'", other.offset)),
                    None => Err(ParseError::new("missing ')'", self.end)),
                }
            }
            _ => Err(ParseError::new("unexpected token", token.offset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(expression: &str) -> Vec<Position> {
        parse_formula(expression).unwrap().referenced_cells().to_vec()
    }

    fn error_at(expression: &str) -> usize {
        parse_formula(expression).unwrap_err().offset
    }

    #[test]
    fn test_referenced_cells_in_discovery_order() {
        assert_eq!(
            cells("B2+A1*B2"),
            vec![Position::new(1, 1), Position::new(0, 0), Position::new(1, 1)]
        );
        assert!(cells("1+2").is_empty());
    }

    #[test]
    fn test_out_of_grid_references_are_dangling() {
        assert_eq!(cells("A0"), vec![Position::NONE]);
        assert_eq!(cells("XFE1"), vec![Position::NONE]);
        assert_eq!(cells("#REF!*2"), vec![Position::NONE]);
    }

    #[test]
    fn test_numbers() {
        let eval = |s: &str| parse_formula(s).unwrap().evaluate(|_| Ok(0.0)).unwrap();
        assert_eq!(eval("42"), 42.0);
        assert_eq!(eval("3.25"), 3.25);
        assert_eq!(eval(".5"), 0.5);
        assert_eq!(eval("1e3"), 1000.0);
        assert_eq!(eval("2E-1"), 0.2);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_formula("").is_err());
        assert!(parse_formula("   ").is_err());
        assert_eq!(error_at("1+"), 2);
        assert_eq!(error_at("(1+2"), 4);
        assert_eq!(error_at("1+2)"), 3);
        assert_eq!(error_at("A"), 1);
        assert_eq!(error_at("a1"), 0);
        assert_eq!(error_at("1 2"), 2);
        assert_eq!(error_at("SUM(A1)"), 3);
        assert_eq!(error_at("1+*2"), 2);
        assert_eq!(error_at("."), 0);
        assert_eq!(error_at("1e999"), 0);
    }

    #[test]
    fn test_error_message_mentions_offset() {
        let err = parse_formula("1 $ 2").unwrap_err();
        assert_eq!(err.to_string(), "unexpected character '$' at offset 2");
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = format!("{}1{}", "(".repeat(MAX_NESTING + 10), ")".repeat(MAX_NESTING + 10));
        assert!(parse_formula(&deep).is_err());

        let signs = format!("{}1", "-".repeat(MAX_NESTING + 10));
        assert!(parse_formula(&signs).is_err());

        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert!(parse_formula(&shallow).is_ok());
    }

    #[test]
    fn test_long_operator_runs_are_not_nesting() {
        let sum = vec!["1"; 4 * MAX_NESTING].join("+");
        assert_eq!(
            parse_formula(&sum).unwrap().evaluate(|_| Ok(0.0)),
            Ok((4 * MAX_NESTING) as f64)
        );

        let product = vec!["B2"; 3000].join("*");
        let formula = parse_formula(&product).unwrap();
        assert_eq!(formula.referenced_cells().len(), 3000);
        assert_eq!(formula.evaluate(|_| Ok(1.0)), Ok(1.0));
    }
}
