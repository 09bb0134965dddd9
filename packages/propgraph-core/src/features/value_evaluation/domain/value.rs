//! Concrete values produced by the evaluation engine
//!
//! The original open-world "any number type" coercion collapses into a small
//! closed enum here: integers are widened to `i64`, floating point values to
//! `f64`, and mixed arithmetic promotes towards `f64` ("more general wins").

use crate::graph::BinaryOp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A concrete value a graph node can evaluate to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view as `f64`, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view as `i64` (floats are truncated), if this is a number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Total comparison across the numeric widths. `Int` compared against
    /// `Float` is promoted, so cross-width comparisons are always defined.
    pub fn compare_numeric(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            _ => None,
        }
    }

    /// Successor value for `++`.
    pub fn incremented(&self) -> Option<Value> {
        match self {
            Value::Int(i) => Some(Value::Int(i.wrapping_add(1))),
            Value::Float(f) => Some(Value::Float(f + 1.0)),
            _ => None,
        }
    }

    /// Predecessor value for `--`.
    pub fn decremented(&self) -> Option<Value> {
        match self {
            Value::Int(i) => Some(Value::Int(i.wrapping_sub(1))),
            Value::Float(f) => Some(Value::Float(f - 1.0)),
            _ => None,
        }
    }

    /// Arithmetic negation for unary `-`.
    pub fn negated(&self) -> Option<Value> {
        match self {
            Value::Int(i) => Some(Value::Int(i.wrapping_neg())),
            Value::Float(f) => Some(Value::Float(-f)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Computes the effect of a binary operator on two concrete values.
///
/// Returns `None` when the combination is not defined (division by zero,
/// bit operations on floats, comparisons between a string and a number, ...),
/// which the engine reports as "cannot evaluate".
pub fn compute_binary_op(lhs: &Value, rhs: &Value, op: BinaryOp) -> Option<Value> {
    use BinaryOp::*;
    match op {
        Add => add(lhs, rhs),
        Sub => arith(lhs, rhs, i64::wrapping_sub, |a, b| a - b),
        Mul => arith(lhs, rhs, i64::wrapping_mul, |a, b| a * b),
        Div => div(lhs, rhs),
        Shl => int_op(lhs, rhs, |a, b| a.wrapping_shl(b as u32)),
        Shr => int_op(lhs, rhs, |a, b| a.wrapping_shr(b as u32)),
        BitAnd => int_op(lhs, rhs, |a, b| a & b),
        BitOr => int_op(lhs, rhs, |a, b| a | b),
        BitXor => int_op(lhs, rhs, |a, b| a ^ b),
        Gt => compare(lhs, rhs, |o| o == Ordering::Greater),
        Ge => compare(lhs, rhs, |o| o != Ordering::Less),
        Lt => compare(lhs, rhs, |o| o == Ordering::Less),
        Le => compare(lhs, rhs, |o| o != Ordering::Greater),
        Eq => equality(lhs, rhs, true),
        Ne => equality(lhs, rhs, false),
    }
}

fn add(lhs: &Value, rhs: &Value) -> Option<Value> {
    // String concatenation piggybacks on `+`, everything else is arithmetic.
    if let Value::Str(s) = lhs {
        return Some(Value::Str(format!("{s}{rhs}")));
    }
    arith(lhs, rhs, i64::wrapping_add, |a, b| a + b)
}

fn arith(
    lhs: &Value,
    rhs: &Value,
    int_f: fn(i64, i64) -> i64,
    float_f: fn(f64, f64) -> f64,
) -> Option<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(Value::Int(int_f(*a, *b))),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            Some(Value::Float(float_f(a.as_f64()?, b.as_f64()?)))
        }
        _ => None,
    }
}

fn div(lhs: &Value, rhs: &Value) -> Option<Value> {
    match rhs {
        Value::Int(0) => return None,
        Value::Float(f) if *f == 0.0 => return None,
        _ => {}
    }
    arith(lhs, rhs, i64::wrapping_div, |a, b| a / b)
}

fn int_op(lhs: &Value, rhs: &Value, f: fn(i64, i64) -> i64) -> Option<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(Value::Int(f(*a, *b))),
        _ => None,
    }
}

fn compare(lhs: &Value, rhs: &Value, f: fn(Ordering) -> bool) -> Option<Value> {
    lhs.compare_numeric(rhs).map(|o| Value::Bool(f(o)))
}

fn equality(lhs: &Value, rhs: &Value, want_equal: bool) -> Option<Value> {
    let equal = match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (a, b) if a.is_numeric() && b.is_numeric() => {
            a.compare_numeric(b) == Some(Ordering::Equal)
        }
        _ => return None,
    };
    Some(Value::Bool(equal == want_equal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition() {
        assert_eq!(
            compute_binary_op(&Value::Int(2), &Value::Int(3), BinaryOp::Add),
            Some(Value::Int(5))
        );
        // int + float promotes to float
        assert_eq!(
            compute_binary_op(&Value::Int(2), &Value::Float(1.5), BinaryOp::Add),
            Some(Value::Float(3.5))
        );
        // string concatenation
        assert_eq!(
            compute_binary_op(
                &Value::Str("ab".into()),
                &Value::Int(3),
                BinaryOp::Add
            ),
            Some(Value::Str("ab3".into()))
        );
    }

    #[test]
    fn test_division_by_zero_is_undefined() {
        assert_eq!(
            compute_binary_op(&Value::Int(4), &Value::Int(0), BinaryOp::Div),
            None
        );
        assert_eq!(
            compute_binary_op(&Value::Float(4.0), &Value::Float(0.0), BinaryOp::Div),
            None
        );
    }

    #[test]
    fn test_cross_width_comparison() {
        assert_eq!(
            compute_binary_op(&Value::Int(2), &Value::Float(2.5), BinaryOp::Lt),
            Some(Value::Bool(true))
        );
        assert_eq!(
            compute_binary_op(&Value::Float(2.0), &Value::Int(2), BinaryOp::Eq),
            Some(Value::Bool(true))
        );
    }

    #[test]
    fn test_bit_ops_are_integer_only() {
        assert_eq!(
            compute_binary_op(&Value::Int(6), &Value::Int(3), BinaryOp::BitAnd),
            Some(Value::Int(2))
        );
        assert_eq!(
            compute_binary_op(&Value::Float(6.0), &Value::Int(3), BinaryOp::BitAnd),
            None
        );
    }

    #[test]
    fn test_unary_helpers() {
        assert_eq!(Value::Int(3).incremented(), Some(Value::Int(4)));
        assert_eq!(Value::Int(3).decremented(), Some(Value::Int(2)));
        assert_eq!(Value::Float(1.5).negated(), Some(Value::Float(-1.5)));
        assert_eq!(Value::Str("x".into()).negated(), None);
    }
}
