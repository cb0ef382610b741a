// SPDX-License-Identifier: MIT

//! Floating point constraints such as `glibc >= 2.17`
//!
//! Set membership (`in` / `not_in`) compares exact values; there is no
//! epsilon tolerance, so `2.0` and `1.9999999` are different entries.

use std::any::Any;
use std::fmt;

use super::{compare_ordered, downcast, parse_operand, ConstraintType, ConstraintValue, Operand};
use crate::constraint::expression::CompareOp;
use crate::error::ValueError;

pub(crate) const TYPE_NAME: &str = "double";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleType;

impl ConstraintType for DoubleType {
    fn name(&self) -> &str {
        TYPE_NAME
    }

    fn supported_ops(&self) -> &[CompareOp] {
        &super::ALL_OPS
    }

    fn new_value(&self, op: CompareOp) -> Result<Box<dyn ConstraintValue>, ValueError> {
        Ok(Box::new(DoubleValue::new(op)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoubleValue {
    op: CompareOp,
    operand: Operand<f64>,
}

impl DoubleValue {
    pub fn new(op: CompareOp) -> Self {
        Self {
            op,
            operand: Operand::Unset,
        }
    }

    pub fn scalar(op: CompareOp, value: f64) -> Self {
        Self {
            op,
            operand: Operand::Scalar(value),
        }
    }

    /// Set operand for `in` / `not_in`
    pub fn set(op: CompareOp, values: impl IntoIterator<Item = f64>) -> Self {
        let mut values: Vec<f64> = values.into_iter().collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        Self {
            op,
            operand: Operand::Set(values),
        }
    }

    /// A node-reported number
    pub fn reported(value: f64) -> Self {
        Self::scalar(CompareOp::Equal, value)
    }

    pub fn operand(&self) -> &Operand<f64> {
        &self.operand
    }
}

impl fmt::Display for DoubleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operand)
    }
}

fn parse_double(token: &str) -> Result<f64, ValueError> {
    let value = token
        .parse::<f64>()
        .map_err(|e| ValueError::malformed(format!("'{}' is not a number: {}", token, e)))?;
    if !value.is_finite() {
        return Err(ValueError::malformed(format!(
            "'{}' is not a finite number",
            token
        )));
    }
    Ok(value)
}

impl ConstraintValue for DoubleValue {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn op(&self) -> CompareOp {
        self.op
    }

    fn parse(&mut self, text: &str, offset: usize) -> Result<usize, ValueError> {
        let (operand, end) = parse_operand(text, offset, self.op, parse_double)?;
        self.operand = match operand {
            Operand::Set(values) => Self::set(self.op, values).operand,
            other => other,
        };
        Ok(end)
    }

    fn matches(&self, node_value: &dyn ConstraintValue) -> Option<bool> {
        let node = downcast::<DoubleValue>(node_value)?;
        match &node.operand {
            Operand::Scalar(reported) => Some(compare_ordered(self.op, reported, &self.operand)),
            _ => Some(false),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_eq(&self, other: &dyn ConstraintValue) -> bool {
        downcast::<DoubleValue>(other).is_some_and(|o| self == o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_with_inner_spaces() {
        let mut value = DoubleValue::new(CompareOp::NotIn);
        let text = "glibc not_in ( 1.2, 2.0)";
        let end = value.parse(text, 13).unwrap();
        assert_eq!(end, text.len());
        assert_eq!(value, DoubleValue::set(CompareOp::NotIn, [2.0, 1.2]));
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert!(DoubleValue::new(CompareOp::Equal).parse("nan", 0).is_err());
        assert!(DoubleValue::new(CompareOp::Equal).parse("inf", 0).is_err());
        assert!(DoubleValue::new(CompareOp::Equal).parse("1.2.3", 0).is_err());
    }

    #[test]
    fn test_membership_is_exact() {
        let not_in = DoubleValue::set(CompareOp::NotIn, [1.2, 2.0]);
        assert_eq!(not_in.matches(&DoubleValue::reported(1.5)), Some(true));
        assert_eq!(not_in.matches(&DoubleValue::reported(2.0)), Some(false));
        assert_eq!(not_in.matches(&DoubleValue::reported(2.0000001)), Some(true));
    }

    #[test]
    fn test_matches_ordering() {
        let gt = DoubleValue::scalar(CompareOp::GreaterThan, 2.17);
        assert_eq!(gt.matches(&DoubleValue::reported(2.31)), Some(true));
        assert_eq!(gt.matches(&DoubleValue::reported(2.17)), Some(false));
    }

    #[test]
    fn test_display() {
        assert_eq!(DoubleValue::scalar(CompareOp::Equal, 1.5).to_string(), "1.5");
        assert_eq!(
            DoubleValue::set(CompareOp::In, [2.5, 1.2]).to_string(),
            "(1.2, 2.5)"
        );
    }
}
