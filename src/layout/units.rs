//! Unit conversion and expression evaluation
//!
//! Expressions evaluate to a [`Value`] that still carries its unit. Relative
//! units (percent, natural sizes) only become pixels once the caller knows
//! which basis dimension they refer to.

use crate::parser::ast::{BinaryOp, Expr, Identifier, Span, Spanned, Unit, Value};

use super::error::LayoutError;

/// Pixels per unit at 96 DPI, for absolute units
pub fn pixel_factor(unit: Unit) -> Option<f64> {
    match unit {
        Unit::None | Unit::Pixels => Some(1.0),
        Unit::Centimeters => Some(37.7953),
        Unit::Millimeters => Some(3.77953),
        Unit::Meters => Some(3779.53),
        Unit::Inches => Some(96.0),
        Unit::Points => Some(1.3333),
        Unit::Percent | Unit::Natural(_) => None,
    }
}

/// Convert a value to pixels. Relative values need a basis; `None` is
/// returned when there is none.
pub fn to_pixels(value: Value, basis: Option<f64>) -> Option<f64> {
    match value.unit {
        Unit::Percent => basis.map(|b| b * value.number / 100.0),
        Unit::Natural(size) => basis.map(|b| b * value.number * size.fraction()),
        unit => pixel_factor(unit).map(|f| value.number * f),
    }
}

fn additive_unit(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Unit, String> {
    match (lhs.unit, rhs.unit) {
        (Unit::None, u) | (u, Unit::None) => Ok(u),
        (a, b) if a == b => Ok(a),
        (a, b) => Err(format!(
            "cannot apply '{}' to values in {} and {}",
            op, a, b
        )),
    }
}

fn multiplicative_unit(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Unit, String> {
    match (lhs.unit, rhs.unit) {
        (Unit::None, u) | (u, Unit::None) => Ok(u),
        (a, b) => Err(format!(
            "cannot apply '{}' to values with units on both sides ({} and {})",
            op, a, b
        )),
    }
}

/// Reject a number that overflowed to infinity or is otherwise not finite
pub fn finite(number: f64, owner: &str, span: &Span) -> Result<f64, LayoutError> {
    if number.is_finite() {
        Ok(number)
    } else {
        Err(LayoutError::invalid_value(
            owner,
            "value is too large to represent",
            span.clone(),
        ))
    }
}

/// Evaluate an expression, resolving variables through `lookup`.
///
/// `owner` names the element or variable the expression belongs to and is
/// only used in error messages.
pub fn evaluate(
    expr: &Expr,
    span: &Span,
    owner: &str,
    lookup: &mut dyn FnMut(&Spanned<Identifier>) -> Result<Value, LayoutError>,
) -> Result<Value, LayoutError> {
    match expr {
        Expr::Literal(value) => Ok(*value),
        Expr::Var(id) => lookup(id),
        Expr::Neg(inner) => {
            let v = evaluate(inner, span, owner, lookup)?;
            Ok(Value::new(finite(-v.number, owner, span)?, v.unit))
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = evaluate(lhs, span, owner, lookup)?;
            let r = evaluate(rhs, span, owner, lookup)?;
            let unit = match op {
                BinaryOp::Add | BinaryOp::Sub => additive_unit(*op, l, r),
                BinaryOp::Mul | BinaryOp::Div => multiplicative_unit(*op, l, r),
            }
            .map_err(|reason| LayoutError::unit_mismatch(reason, span.clone()))?;

            let number = match op {
                BinaryOp::Add => l.number + r.number,
                BinaryOp::Sub => l.number - r.number,
                BinaryOp::Mul => l.number * r.number,
                BinaryOp::Div => {
                    if r.number == 0.0 {
                        return Err(LayoutError::invalid_value(
                            owner,
                            "division by zero",
                            span.clone(),
                        ));
                    }
                    l.number / r.number
                }
            };
            Ok(Value::new(finite(number, owner, span)?, unit))
        }
    }
}
