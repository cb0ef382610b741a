// SPDX-License-Identifier: MIT

//! 64-bit integer constraints such as `num_of_disks >= 3`

use std::any::Any;
use std::fmt;

use super::{compare_ordered, downcast, parse_operand, ConstraintType, ConstraintValue, Operand};
use crate::constraint::expression::CompareOp;
use crate::error::ValueError;

pub(crate) const TYPE_NAME: &str = "long";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LongType;

impl ConstraintType for LongType {
    fn name(&self) -> &str {
        TYPE_NAME
    }

    fn supported_ops(&self) -> &[CompareOp] {
        &super::ALL_OPS
    }

    fn new_value(&self, op: CompareOp) -> Result<Box<dyn ConstraintValue>, ValueError> {
        Ok(Box::new(LongValue::new(op)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongValue {
    op: CompareOp,
    operand: Operand<i64>,
}

impl LongValue {
    pub fn new(op: CompareOp) -> Self {
        Self {
            op,
            operand: Operand::Unset,
        }
    }

    pub fn scalar(op: CompareOp, value: i64) -> Self {
        Self {
            op,
            operand: Operand::Scalar(value),
        }
    }

    /// Set operand for `in` / `not_in`
    pub fn set(op: CompareOp, values: impl IntoIterator<Item = i64>) -> Self {
        let mut values: Vec<i64> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Self {
            op,
            operand: Operand::Set(values),
        }
    }

    /// A node-reported integer
    pub fn reported(value: i64) -> Self {
        Self::scalar(CompareOp::Equal, value)
    }

    pub fn operand(&self) -> &Operand<i64> {
        &self.operand
    }
}

impl fmt::Display for LongValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operand)
    }
}

fn parse_long(token: &str) -> Result<i64, ValueError> {
    token
        .parse::<i64>()
        .map_err(|e| ValueError::malformed(format!("'{}' is not an integer: {}", token, e)))
}

impl ConstraintValue for LongValue {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn op(&self) -> CompareOp {
        self.op
    }

    fn parse(&mut self, text: &str, offset: usize) -> Result<usize, ValueError> {
        let (operand, end) = parse_operand(text, offset, self.op, parse_long)?;
        self.operand = match operand {
            Operand::Set(values) => Self::set(self.op, values).operand,
            other => other,
        };
        Ok(end)
    }

    fn matches(&self, node_value: &dyn ConstraintValue) -> Option<bool> {
        let node = downcast::<LongValue>(node_value)?;
        match &node.operand {
            Operand::Scalar(reported) => Some(compare_ordered(self.op, reported, &self.operand)),
            _ => Some(false),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_eq(&self, other: &dyn ConstraintValue) -> bool {
        downcast::<LongValue>(other).is_some_and(|o| self == o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar() {
        let mut value = LongValue::new(CompareOp::GreaterOrEqual);
        let end = value.parse("num_of_disks >= 3 || has_ssd", 16).unwrap();
        assert_eq!(end, 17);
        assert_eq!(value, LongValue::scalar(CompareOp::GreaterOrEqual, 3));
    }

    #[test]
    fn test_parse_negative() {
        let mut value = LongValue::new(CompareOp::GreaterThan);
        value.parse("-12", 0).unwrap();
        assert_eq!(value.operand(), &Operand::Scalar(-12));
    }

    #[test]
    fn test_parse_set_is_sorted_and_deduplicated() {
        let mut value = LongValue::new(CompareOp::In);
        let end = value.parse("(4, 2, 4)", 0).unwrap();
        assert_eq!(end, 9);
        assert_eq!(value, LongValue::set(CompareOp::In, [2, 4]));
    }

    #[test]
    fn test_parse_rejects_non_integer() {
        assert!(LongValue::new(CompareOp::Equal).parse("3.5", 0).is_err());
        assert!(LongValue::new(CompareOp::Equal).parse("abc", 0).is_err());
        assert!(LongValue::new(CompareOp::In).parse("(1, x)", 0).is_err());
        assert!(LongValue::new(CompareOp::In).parse("1", 0).is_err());
    }

    #[test]
    fn test_matches_ordering() {
        let ge = LongValue::scalar(CompareOp::GreaterOrEqual, 3);
        assert_eq!(ge.matches(&LongValue::reported(2)), Some(false));
        assert_eq!(ge.matches(&LongValue::reported(3)), Some(true));

        let lt = LongValue::scalar(CompareOp::LessThan, 3);
        assert_eq!(lt.matches(&LongValue::reported(2)), Some(true));
        assert_eq!(lt.matches(&LongValue::reported(3)), Some(false));
    }

    #[test]
    fn test_matches_membership() {
        let not_in = LongValue::set(CompareOp::NotIn, [1, 2]);
        assert_eq!(not_in.matches(&LongValue::reported(3)), Some(true));
        assert_eq!(not_in.matches(&LongValue::reported(2)), Some(false));
    }

    #[test]
    fn test_unparsed_node_value_never_matches() {
        let eq = LongValue::scalar(CompareOp::Equal, 0);
        assert_eq!(eq.matches(&LongValue::new(CompareOp::Equal)), Some(false));
    }
}
