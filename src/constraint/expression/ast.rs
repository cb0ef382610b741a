// SPDX-License-Identifier: MIT

//! Expression tree for constraint expressions

use std::fmt;
use std::sync::Arc;

use crate::constraint::types::{ConstraintType, ConstraintValue};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `<` or `lt`
    LessThan,
    /// `<=` or `le`
    LessOrEqual,
    /// `==` or `eq`
    Equal,
    /// `!=`, `ne` or `ene`
    NotEqual,
    /// `>=` or `ge`
    GreaterOrEqual,
    /// `>` or `gt`
    GreaterThan,
    /// `in (a, b)`
    In,
    /// `not_in (a, b)`
    NotIn,
    /// bare constraint name
    Exists,
    /// `!name`
    NotExists,
}

impl CompareOp {
    /// Operators that take a parenthesized set as operand
    pub fn takes_set(self) -> bool {
        matches!(self, CompareOp::In | CompareOp::NotIn)
    }

    /// Operators that take no operand at all
    pub fn is_existence(self) -> bool {
        matches!(self, CompareOp::Exists | CompareOp::NotExists)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::LessThan => write!(f, "<"),
            CompareOp::LessOrEqual => write!(f, "<="),
            CompareOp::Equal => write!(f, "=="),
            CompareOp::NotEqual => write!(f, "!="),
            CompareOp::GreaterOrEqual => write!(f, ">="),
            CompareOp::GreaterThan => write!(f, ">"),
            CompareOp::In => write!(f, "in"),
            CompareOp::NotIn => write!(f, "not_in"),
            CompareOp::Exists => write!(f, "exists"),
            CompareOp::NotExists => write!(f, "not_exists"),
        }
    }
}

/// Boolean operators joining sub-expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, "&&"),
            BoolOp::Or => write!(f, "||"),
        }
    }
}

/// A single named-attribute comparison (leaf)
#[derive(Debug, Clone)]
pub struct CompareExpression {
    name: String,
    constraint_type: Arc<dyn ConstraintType>,
    op: CompareOp,
    value: Option<Arc<dyn ConstraintValue>>,
    must_exist: bool,
}

impl CompareExpression {
    /// Create a leaf. `must_exist` defaults to false for `NotExists` and
    /// `NotEqual`, true otherwise.
    pub fn new(
        name: impl Into<String>,
        constraint_type: Arc<dyn ConstraintType>,
        op: CompareOp,
        value: Option<Box<dyn ConstraintValue>>,
    ) -> Self {
        let must_exist = !matches!(op, CompareOp::NotExists | CompareOp::NotEqual);
        Self {
            name: name.into().to_lowercase(),
            constraint_type,
            op,
            value: value.map(Arc::from),
            must_exist,
        }
    }

    /// Override the missing-attribute behavior
    pub fn with_must_exist(mut self, must_exist: bool) -> Self {
        self.must_exist = must_exist;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> &Arc<dyn ConstraintType> {
        &self.constraint_type
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn value(&self) -> Option<&dyn ConstraintValue> {
        self.value.as_deref()
    }

    pub fn must_exist(&self) -> bool {
        self.must_exist
    }
}

// must_exist is deliberately left out: it is derived from how the operator
// was written, not from what the leaf tests.
impl PartialEq for CompareExpression {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.constraint_type.name() == other.constraint_type.name()
            && self.op == other.op
            && match (&self.value, &other.value) {
                (None, None) => true,
                (Some(a), Some(b)) => a.value_eq(b.as_ref()),
                _ => false,
            }
    }
}

impl fmt::Display for CompareExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.op, &self.value) {
            (CompareOp::Exists, _) => write!(f, "{}", self.name),
            (CompareOp::NotExists, _) => write!(f, "!{}", self.name),
            (op, Some(value)) => write!(f, "{} {} {}", self.name, op, value),
            (op, None) => write!(f, "{} {} ?", self.name, op),
        }
    }
}

/// A boolean combination of sub-expressions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpressionList {
    op: BoolOp,
    children: Vec<Expression>,
}

impl ExpressionList {
    /// Create an empty list
    pub fn new(op: BoolOp) -> Self {
        Self {
            op,
            children: Vec::new(),
        }
    }

    /// Create a list with the given children, kept in order
    pub fn with_children(op: BoolOp, children: Vec<Expression>) -> Self {
        Self { op, children }
    }

    pub fn op(&self) -> BoolOp {
        self.op
    }

    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn push(&mut self, child: impl Into<Expression>) {
        self.children.push(child.into());
    }

    /// Number of leaves in the whole tree
    pub fn leaf_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                Expression::Compare(_) => 1,
                Expression::List(list) => list.leaf_count(),
            })
            .sum()
    }
}

impl fmt::Display for ExpressionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.op)?;
            }
            match child {
                Expression::Compare(leaf) => write!(f, "{}", leaf)?,
                Expression::List(list) => write!(f, "({})", list)?,
            }
        }
        Ok(())
    }
}

/// A node in the expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Leaf comparison
    Compare(CompareExpression),
    /// Nested AND/OR list
    List(ExpressionList),
}

impl From<CompareExpression> for Expression {
    fn from(leaf: CompareExpression) -> Self {
        Expression::Compare(leaf)
    }
}

impl From<ExpressionList> for Expression {
    fn from(list: ExpressionList) -> Self {
        Expression::List(list)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Compare(leaf) => write!(f, "{}", leaf),
            Expression::List(list) => write!(f, "({})", list),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::types::{self, LongValue};

    #[test]
    fn test_compare_op_display() {
        assert_eq!(format!("{}", CompareOp::Equal), "==");
        assert_eq!(format!("{}", CompareOp::NotEqual), "!=");
        assert_eq!(format!("{}", CompareOp::GreaterThan), ">");
        assert_eq!(format!("{}", CompareOp::GreaterOrEqual), ">=");
        assert_eq!(format!("{}", CompareOp::LessThan), "<");
        assert_eq!(format!("{}", CompareOp::LessOrEqual), "<=");
        assert_eq!(format!("{}", CompareOp::In), "in");
        assert_eq!(format!("{}", CompareOp::NotIn), "not_in");
    }

    #[test]
    fn test_default_must_exist() {
        let long = types::long();
        assert!(CompareExpression::new("a", long.clone(), CompareOp::Exists, None).must_exist());
        assert!(!CompareExpression::new("a", long.clone(), CompareOp::NotExists, None).must_exist());
        let ne = CompareExpression::new(
            "a",
            long,
            CompareOp::NotEqual,
            Some(Box::new(LongValue::scalar(CompareOp::NotEqual, 1))),
        );
        assert!(!ne.must_exist());
    }

    #[test]
    fn test_equality_ignores_must_exist() {
        let a = CompareExpression::new("disks", types::long(), CompareOp::Exists, None);
        let b = a.clone().with_must_exist(false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_compares_values() {
        let three = CompareExpression::new(
            "disks",
            types::long(),
            CompareOp::GreaterOrEqual,
            Some(Box::new(LongValue::scalar(CompareOp::GreaterOrEqual, 3))),
        );
        let four = CompareExpression::new(
            "disks",
            types::long(),
            CompareOp::GreaterOrEqual,
            Some(Box::new(LongValue::scalar(CompareOp::GreaterOrEqual, 4))),
        );
        assert_ne!(three, four);
        assert_eq!(three, three.clone());
    }

    #[test]
    fn test_name_is_case_folded() {
        let leaf = CompareExpression::new("NUM_OF_DISKS", types::long(), CompareOp::Exists, None);
        assert_eq!(leaf.name(), "num_of_disks");
    }

    #[test]
    fn test_list_display() {
        let inner = ExpressionList::with_children(
            BoolOp::Or,
            vec![
                CompareExpression::new(
                    "disks",
                    types::long(),
                    CompareOp::GreaterOrEqual,
                    Some(Box::new(LongValue::scalar(CompareOp::GreaterOrEqual, 3))),
                )
                .into(),
                CompareExpression::new("has_ssd", types::boolean(), CompareOp::Exists, None).into(),
            ],
        );
        let outer = ExpressionList::with_children(
            BoolOp::And,
            vec![
                inner.into(),
                CompareExpression::new("windows", types::boolean(), CompareOp::NotExists, None)
                    .into(),
            ],
        );
        assert_eq!(outer.to_string(), "(disks >= 3 || has_ssd) && !windows");
        assert_eq!(outer.leaf_count(), 3);
    }
}
