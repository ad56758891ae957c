//! Parsed arithmetic formulas.
//!
//! A [`Formula`] is an expression tree over numbers and cell references. It
//! knows nothing about the sheet it lives in: evaluation resolves every
//! reference through a caller-supplied lookup, and the first failing lookup
//! (or a non-finite intermediate result) aborts the whole expression.

use std::fmt;

use super::format::format_number;
use super::position::Position;
use super::value::FormulaError;

/// Precedence of literals and references.
const ATOM_PRECEDENCE: u8 = 4;
const UNARY_PRECEDENCE: u8 = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    fn symbol(self) -> char {
        match self {
            UnaryOp::Plus => '+',
            UnaryOp::Minus => '-',
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        }
    }

    /// `a - (b + c)` and `a / (b * c)` change meaning without parentheses.
    fn is_right_sensitive(self) -> bool {
        matches!(self, BinaryOp::Sub | BinaryOp::Div)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    /// Invalid positions are kept so they can evaluate to `#REF!`.
    Cell(Position),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `first op1 x1 op2 x2 ...`, applied left to right. Every operator in
    /// `rest` shares one precedence level and `rest` is never empty.
    Chain {
        first: Box<Expr>,
        rest: Vec<(BinaryOp, Expr)>,
    },
}

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::Cell(_) => ATOM_PRECEDENCE,
            Expr::Unary { .. } => UNARY_PRECEDENCE,
            Expr::Chain { rest, .. } => rest
                .first()
                .map_or(ATOM_PRECEDENCE, |(op, _)| op.precedence()),
        }
    }

    fn evaluate(
        &self,
        lookup: &dyn Fn(Position) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Cell(pos) => lookup(*pos),
            Expr::Unary { op, operand } => {
                let value = operand.evaluate(lookup)?;
                Ok(match op {
                    UnaryOp::Plus => value,
                    UnaryOp::Minus => -value,
                })
            }
            Expr::Chain { first, rest } => {
                let mut acc = first.evaluate(lookup)?;
                for (op, operand) in rest {
                    acc = op.apply(acc, operand.evaluate(lookup)?);
                    if !acc.is_finite() {
                        return Err(FormulaError::Div0);
                    }
                }
                Ok(acc)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => f.write_str(&format_number(*n)),
            Expr::Cell(pos) if pos.is_valid() => write!(f, "{}", pos),
            Expr::Cell(_) => f.write_str("#REF!"),
            Expr::Unary { op, operand } => {
                write!(f, "{}", op.symbol())?;
                write_operand(f, operand, operand.precedence() < UNARY_PRECEDENCE)
            }
            Expr::Chain { first, rest } => {
                let precedence = self.precedence();
                write_operand(f, first, first.precedence() < precedence)?;
                for (op, operand) in rest {
                    write!(f, "{}", op.symbol())?;
                    let operand_precedence = operand.precedence();
                    let parenthesize = operand_precedence < precedence
                        || (operand_precedence == precedence && op.is_right_sensitive());
                    write_operand(f, operand, parenthesize)?;
                }
                Ok(())
            }
        }
    }
}

/// A parsed formula expression (the part after `=`).
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    expr: Expr,
    referenced_cells: Vec<Position>,
}

impl Formula {
    pub(crate) fn new(expr: Expr, referenced_cells: Vec<Position>) -> Formula {
        Formula {
            expr,
            referenced_cells,
        }
    }

    /// Evaluate the expression, resolving each cell reference through `lookup`.
    ///
    /// The first lookup error is returned as-is; arithmetic that leaves the
    /// finite range fails with [`FormulaError::Div0`].
    pub fn evaluate<F>(&self, lookup: F) -> Result<f64, FormulaError>
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        self.expr.evaluate(&lookup)
    }

    /// Canonical expression text, without the leading `=`.
    pub fn expression(&self) -> String {
        self.expr.to_string()
    }

    /// Positions read by the expression, in the order they appear.
    /// Repeated references are listed once per occurrence.
    pub fn referenced_cells(&self) -> &[Position] {
        &self.referenced_cells
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse_formula;
    use super::*;

    fn no_cells(_: Position) -> Result<f64, FormulaError> {
        Ok(0.0)
    }

    fn eval(expression: &str) -> Result<f64, FormulaError> {
        parse_formula(expression).unwrap().evaluate(no_cells)
    }

    fn canonical(expression: &str) -> String {
        parse_formula(expression).unwrap().expression()
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval("1+2*3"), Ok(7.0));
        assert_eq!(eval("(1+2)*3"), Ok(9.0));
        assert_eq!(eval("10-4-3"), Ok(3.0));
        assert_eq!(eval("24/4/3"), Ok(2.0));
        assert_eq!(eval("-2*-3"), Ok(6.0));
        assert_eq!(eval("+5"), Ok(5.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1/0"), Err(FormulaError::Div0));
        assert_eq!(eval("0/0"), Err(FormulaError::Div0));
    }

    #[test]
    fn test_overflow_is_div0() {
        assert_eq!(eval("1e308*10"), Err(FormulaError::Div0));
    }

    #[test]
    fn test_lookup_values_and_errors() {
        let formula = parse_formula("A1+B1*2").unwrap();
        let value = formula.evaluate(|pos| match pos.col {
            0 => Ok(1.5),
            _ => Ok(4.0),
        });
        assert_eq!(value, Ok(9.5));

        let value = formula.evaluate(|pos| match pos.col {
            0 => Err(FormulaError::Value),
            _ => Err(FormulaError::Ref),
        });
        assert_eq!(value, Err(FormulaError::Value));
    }

    #[test]
    fn test_first_error_short_circuits() {
        let formula = parse_formula("A1+B1").unwrap();
        let calls = std::cell::Cell::new(0);
        let value = formula.evaluate(|_| {
            calls.set(calls.get() + 1);
            Err(FormulaError::Ref)
        });
        assert_eq!(value, Err(FormulaError::Ref));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_canonical_text_drops_redundant_parens() {
        assert_eq!(canonical("1+(2*3)"), "1+2*3");
        assert_eq!(canonical("(1+2)*3"), "(1+2)*3");
        assert_eq!(canonical(" ( A1 ) + B2 "), "A1+B2");
        assert_eq!(canonical("1-(2+3)"), "1-(2+3)");
        assert_eq!(canonical("1/(2*3)"), "1/(2*3)");
        assert_eq!(canonical("(1/2)*3"), "1/2*3");
        assert_eq!(canonical("-(1+2)"), "-(1+2)");
        assert_eq!(canonical("-(-1)"), "--1");
        assert_eq!(canonical("2.50"), "2.5");
    }

    #[test]
    fn test_canonical_text_reparses_to_same_tree() {
        for expression in ["1-(2-3)", "(A1+B2)/(C3-4)", "-(A1*2)/-B1", "((1))+2*(3+4)"] {
            let formula = parse_formula(expression).unwrap();
            let reparsed = parse_formula(&formula.expression()).unwrap();
            assert_eq!(reparsed, formula, "{}", expression);
        }
    }

    #[test]
    fn test_long_sum_is_one_flat_chain() {
        let terms: Vec<String> = (1..=5000).map(|row| format!("A{}", row)).collect();
        let expression = terms.join("+");
        let formula = parse_formula(&expression).unwrap();

        assert_eq!(formula.referenced_cells().len(), 5000);
        assert_eq!(formula.evaluate(|_| Ok(2.0)), Ok(10000.0));
        assert_eq!(formula.expression(), expression);
        match &formula.expr {
            Expr::Chain { rest, .. } => assert_eq!(rest.len(), 4999),
            other => panic!("expected a chain, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_chain_keeps_left_to_right_order() {
        assert_eq!(eval("1-2+3-4"), Ok(-2.0));
        assert_eq!(eval("2*3/4*8"), Ok(12.0));
        assert_eq!(canonical("(1-2)-3"), "1-2-3");
        assert_eq!(canonical("1-(2-3)+4"), "1-(2-3)+4");
    }

    #[test]
    fn test_chain_overflow_midway_is_div0() {
        assert_eq!(eval("1e308*10/100"), Err(FormulaError::Div0));
    }

    #[test]
    fn test_invalid_reference_renders_ref() {
        let formula = parse_formula("ZZZZ1+1").unwrap();
        assert_eq!(formula.expression(), "#REF!+1");
        assert_eq!(formula.referenced_cells(), &[Position::NONE]);
    }
}
