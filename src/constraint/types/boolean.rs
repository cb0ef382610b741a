// SPDX-License-Identifier: MIT

//! Boolean constraints such as `has_gpu` or `windows == false`

use std::any::Any;
use std::fmt;

use super::{downcast, scalar_operand, ConstraintType, ConstraintValue};
use crate::constraint::expression::CompareOp;
use crate::error::ValueError;

pub(crate) const TYPE_NAME: &str = "boolean";

const SUPPORTED_OPS: [CompareOp; 4] = [
    CompareOp::Exists,
    CompareOp::NotExists,
    CompareOp::Equal,
    CompareOp::NotEqual,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanType;

impl ConstraintType for BooleanType {
    fn name(&self) -> &str {
        TYPE_NAME
    }

    fn supported_ops(&self) -> &[CompareOp] {
        &SUPPORTED_OPS
    }

    fn new_value(&self, op: CompareOp) -> Result<Box<dyn ConstraintValue>, ValueError> {
        if !self.supports(op) {
            return Err(ValueError::unsupported(op, TYPE_NAME));
        }
        Ok(Box::new(BooleanValue::new(op)))
    }
}

/// A boolean operand. Unparsed values read as `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanValue {
    op: CompareOp,
    value: bool,
}

impl BooleanValue {
    pub fn new(op: CompareOp) -> Self {
        Self { op, value: false }
    }

    pub fn of(op: CompareOp, value: bool) -> Self {
        Self { op, value }
    }

    /// A node-reported boolean
    pub fn reported(value: bool) -> Self {
        Self::of(CompareOp::Equal, value)
    }

    pub fn value(&self) -> bool {
        self.value
    }
}

impl fmt::Display for BooleanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl ConstraintValue for BooleanValue {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn op(&self) -> CompareOp {
        self.op
    }

    fn parse(&mut self, text: &str, offset: usize) -> Result<usize, ValueError> {
        let (token, end) = scalar_operand(text, offset)?;
        self.value = match token.to_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(ValueError::malformed(format!(
                    "'{}' is not a boolean @ {}",
                    other, offset
                )))
            }
        };
        Ok(end)
    }

    fn matches(&self, node_value: &dyn ConstraintValue) -> Option<bool> {
        let node = downcast::<BooleanValue>(node_value)?;
        Some(match self.op {
            CompareOp::Equal => node.value == self.value,
            CompareOp::NotEqual => node.value != self.value,
            CompareOp::Exists | CompareOp::NotExists => true,
            _ => false,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_eq(&self, other: &dyn ConstraintValue) -> bool {
        downcast::<BooleanValue>(other).is_some_and(|o| self == o)
    }
}
