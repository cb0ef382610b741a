// SPDX-License-Identifier: MIT

//! String constraints such as `jdk_type in (open_jdk, oracle_jdk)`
//!
//! Strings are case-folded on the way in, both for operands and for
//! node-reported values.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;

use super::{downcast, scalar_operand, set_operand, write_set, ConstraintType, ConstraintValue};
use crate::constraint::expression::CompareOp;
use crate::error::ValueError;

pub(crate) const TYPE_NAME: &str = "string";

const SUPPORTED_OPS: [CompareOp; 6] = [
    CompareOp::Exists,
    CompareOp::NotExists,
    CompareOp::Equal,
    CompareOp::NotEqual,
    CompareOp::In,
    CompareOp::NotIn,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringSetType;

impl ConstraintType for StringSetType {
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
        Ok(Box::new(StringSetValue::new(op)))
    }
}

/// One string for `==` / `!=`, a set of strings for `in` / `not_in`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSetValue {
    op: CompareOp,
    values: BTreeSet<String>,
}

impl StringSetValue {
    pub fn new(op: CompareOp) -> Self {
        Self {
            op,
            values: BTreeSet::new(),
        }
    }

    pub fn of<I, S>(op: CompareOp, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            op,
            values: values
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// A node-reported string
    pub fn reported(value: &str) -> Self {
        Self::of(CompareOp::Equal, [value])
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }
}

impl fmt::Display for StringSetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op.takes_set() {
            write_set(f, &self.values)
        } else {
            match self.values.iter().next() {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "?"),
            }
        }
    }
}

impl ConstraintValue for StringSetValue {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn op(&self) -> CompareOp {
        self.op
    }

    fn parse(&mut self, text: &str, offset: usize) -> Result<usize, ValueError> {
        if self.op.takes_set() {
            let (entries, end) = set_operand(text, offset)?;
            self.values = entries.into_iter().map(str::to_lowercase).collect();
            Ok(end)
        } else {
            let (token, end) = scalar_operand(text, offset)?;
            self.values = BTreeSet::from([token.to_lowercase()]);
            Ok(end)
        }
    }

    fn matches(&self, node_value: &dyn ConstraintValue) -> Option<bool> {
        let node = downcast::<StringSetValue>(node_value)?;
        if node.values.is_empty() {
            return Some(false);
        }
        Some(match self.op {
            CompareOp::Equal => node.values == self.values,
            CompareOp::NotEqual => node.values != self.values,
            CompareOp::In => node.values.is_subset(&self.values),
            CompareOp::NotIn => node.values.is_disjoint(&self.values),
            CompareOp::Exists | CompareOp::NotExists => true,
            _ => false,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_eq(&self, other: &dyn ConstraintValue) -> bool {
        downcast::<StringSetValue>(other).is_some_and(|o| self == o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        let mut value = StringSetValue::new(CompareOp::In);
        let text = "jdk_type in (open_jdk, oracle_jdk) && glibc";
        let end = value.parse(text, 12).unwrap();
        assert_eq!(end, 34);
        assert_eq!(
            value,
            StringSetValue::of(CompareOp::In, ["open_jdk", "oracle_jdk"])
        );
    }

    #[test]
    fn test_parse_scalar_is_case_folded() {
        let mut value = StringSetValue::new(CompareOp::Equal);
        value.parse("X86_64", 0).unwrap();
        assert_eq!(value, StringSetValue::reported("x86_64"));
    }

    #[test]
    fn test_matches_membership() {
        let in_set = StringSetValue::of(CompareOp::In, ["open_jdk", "oracle_jdk"]);
        assert_eq!(in_set.matches(&StringSetValue::reported("MY_JDK")), Some(false));
        assert_eq!(
            in_set.matches(&StringSetValue::reported("oracle_jdk")),
            Some(true)
        );

        let not_in = StringSetValue::of(CompareOp::NotIn, ["open_jdk"]);
        assert_eq!(
            not_in.matches(&StringSetValue::reported("oracle_jdk")),
            Some(true)
        );
    }

    #[test]
    fn test_matches_equality() {
        let eq = StringSetValue::of(CompareOp::Equal, ["x86_64"]);
        assert_eq!(eq.matches(&StringSetValue::reported("X86_64")), Some(true));

        let ne = StringSetValue::of(CompareOp::NotEqual, ["x86_64"]);
        assert_eq!(ne.matches(&StringSetValue::reported("aarch64")), Some(true));
    }

    #[test]
    fn test_unsupported_ordering() {
        assert!(StringSetType.new_value(CompareOp::LessThan).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StringSetValue::of(CompareOp::In, ["b", "a"]).to_string(),
            "(a, b)"
        );
        assert_eq!(StringSetValue::reported("Linux").to_string(), "linux");
    }
}
