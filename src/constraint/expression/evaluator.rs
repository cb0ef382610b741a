// SPDX-License-Identifier: MIT

//! Constraint expression evaluator
//!
//! Walks a parsed tree against one node's attributes. Lists short-circuit
//! left to right in stored order. A missing attribute is a normal outcome:
//! the leaf fails when it must exist and holds otherwise.

use super::ast::{BoolOp, CompareExpression, CompareOp, Expression, ExpressionList};
use crate::constraint::node::NodeAttributes;
use crate::error::EvaluationError;

/// Evaluate a parsed expression against a node's attributes
pub fn evaluate(list: &ExpressionList, node: &NodeAttributes) -> Result<bool, EvaluationError> {
    match list.op() {
        BoolOp::And => {
            for child in list.children() {
                if !evaluate_expression(child, node)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        BoolOp::Or => {
            for child in list.children() {
                if evaluate_expression(child, node)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Evaluate either kind of tree node
pub fn evaluate_expression(
    expr: &Expression,
    node: &NodeAttributes,
) -> Result<bool, EvaluationError> {
    match expr {
        Expression::Compare(leaf) => evaluate_compare(leaf, node),
        Expression::List(list) => evaluate(list, node),
    }
}

fn evaluate_compare(leaf: &CompareExpression, node: &NodeAttributes) -> Result<bool, EvaluationError> {
    let Some(reported) = node.get(leaf.name()) else {
        log::trace!("Constraint '{}' not reported by node", leaf.name());
        return Ok(!leaf.must_exist());
    };

    let result = match (leaf.op(), leaf.value()) {
        (CompareOp::Exists, _) => true,
        (CompareOp::NotExists, _) => false,
        (_, None) => false,
        (_, Some(value)) => match value.matches(reported) {
            Some(matched) => matched,
            None => {
                log::warn!(
                    "Constraint '{}' expects a {} value but node reported a {} value",
                    leaf.name(),
                    leaf.constraint_type().name(),
                    reported.type_name()
                );
                return Err(EvaluationError::TypeMismatch {
                    name: leaf.name().to_string(),
                    expected: leaf.constraint_type().name().to_string(),
                    found: reported.type_name().to_string(),
                });
            }
        },
    };
    log::trace!("Constraint '{}' evaluated to {}", leaf, result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::expression::parser::parse;
    use crate::constraint::registry::{ConstraintDefinition, ConstraintRegistry};
    use crate::constraint::types::{self, BooleanValue, DoubleValue, LongValue, StringSetValue};

    fn registry() -> ConstraintRegistry {
        ConstraintRegistry::from_definitions([
            ConstraintDefinition::new("has_gpu", types::boolean()),
            ConstraintDefinition::new("linux", types::boolean()),
            ConstraintDefinition::new("windows", types::boolean()),
            ConstraintDefinition::new("has_ssd", types::boolean()),
            ConstraintDefinition::new("architecture", types::string()),
            ConstraintDefinition::new("jdk_type", types::string()),
            ConstraintDefinition::new("num_of_disks", types::long()),
            ConstraintDefinition::new("glibc", types::double()),
        ])
        .unwrap()
    }

    fn eval(expression: &str, node: &NodeAttributes) -> bool {
        let tree = parse(expression, &registry()).unwrap().unwrap();
        evaluate(&tree, node).unwrap()
    }

    #[test]
    fn test_exists() {
        let mut node = NodeAttributes::new();
        assert!(!eval("has_gpu", &node));

        node.insert("has_gpu", BooleanValue::reported(false));
        assert!(eval("has_gpu", &node));
    }

    #[test]
    fn test_not_exists() {
        let mut node = NodeAttributes::new();
        assert!(eval("!windows", &node));

        node.insert("windows", BooleanValue::reported(false));
        assert!(!eval("!windows", &node));
    }

    #[test]
    fn test_number_comparison() {
        let mut node = NodeAttributes::new();
        node.insert("num_of_disks", LongValue::reported(4));

        assert!(eval("num_of_disks > 3", &node));
        assert!(!eval("num_of_disks > 4", &node));
        assert!(eval("num_of_disks >= 4", &node));
        assert!(!eval("num_of_disks >= 5", &node));
        assert!(eval("num_of_disks < 5", &node));
        assert!(!eval("num_of_disks < 4", &node));
        assert!(eval("num_of_disks <= 4", &node));
        assert!(!eval("num_of_disks le 3", &node));
        assert!(eval("num_of_disks eq 4", &node));
        assert!(eval("num_of_disks in (2, 4)", &node));
        assert!(!eval("num_of_disks not_in (2, 4)", &node));
    }

    #[test]
    fn test_missing_attribute() {
        let node = NodeAttributes::new();

        assert!(!eval("num_of_disks >= 3", &node));
        assert!(!eval("num_of_disks == 3", &node));
        assert!(!eval("jdk_type in (open_jdk)", &node));
        // not-equal holds vacuously when the attribute is missing
        assert!(eval("num_of_disks != 3", &node));
        assert!(eval("num_of_disks ene 3", &node));
    }

    #[test]
    fn test_or_short_circuits_over_missing_attribute() {
        let mut node = NodeAttributes::new();
        node.insert("num_of_disks", LongValue::reported(2));
        assert!(!eval("num_of_disks >= 3 || has_ssd", &node));

        node.insert("num_of_disks", LongValue::reported(3));
        assert!(eval("num_of_disks >= 3 || has_ssd", &node));

        let mut node = NodeAttributes::new();
        node.insert("has_ssd", BooleanValue::reported(true));
        assert!(eval("num_of_disks >= 3 || has_ssd", &node));
    }

    #[test]
    fn test_string_membership() {
        let mut node = NodeAttributes::new();
        node.insert("jdk_type", StringSetValue::reported("my_jdk"));
        node.insert("glibc", DoubleValue::reported(1.5));
        let expression = "JDK_TYPE IN (OPEN_JDK, ORACLE_JDK) && GLIBC NOT_IN (1.2, 2.0)";
        assert!(!eval(expression, &node));

        node.insert("jdk_type", StringSetValue::reported("oracle_jdk"));
        assert!(eval(expression, &node));
    }

    #[test]
    fn test_bracketed_expression() {
        let expression = "(NUM_OF_DISKS >= 3 || HAS_SSD) && !WINDOWS";
        let mut node = NodeAttributes::new();
        node.insert("num_of_disks", LongValue::reported(2));
        assert!(!eval(expression, &node));

        node.insert("num_of_disks", LongValue::reported(3));
        assert!(eval(expression, &node));

        node.insert("windows", BooleanValue::reported(false));
        assert!(!eval(expression, &node));
    }

    #[test]
    fn test_boolean_equality() {
        let mut node = NodeAttributes::new();
        node.insert("linux", BooleanValue::reported(true));

        assert!(eval("linux == true", &node));
        assert!(!eval("linux == false", &node));
        assert!(eval("linux != false", &node));
    }

    #[test]
    fn test_empty_list_is_true() {
        let node = NodeAttributes::new();
        assert!(evaluate(&ExpressionList::new(BoolOp::And), &node).unwrap());
        assert!(!evaluate(&ExpressionList::new(BoolOp::Or), &node).unwrap());
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let tree = parse("num_of_disks >= 3", &registry()).unwrap().unwrap();
        let mut node = NodeAttributes::new();
        node.insert("num_of_disks", DoubleValue::reported(3.0));

        let err = evaluate(&tree, &node).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::TypeMismatch {
                name: "num_of_disks".to_string(),
                expected: "long".to_string(),
                found: "double".to_string(),
            }
        );
    }

    #[test]
    fn test_and_short_circuits_before_mismatch() {
        let tree = parse("has_gpu && num_of_disks >= 3", &registry())
            .unwrap()
            .unwrap();
        let mut node = NodeAttributes::new();
        node.insert("num_of_disks", DoubleValue::reported(3.0));
        assert!(!evaluate(&tree, &node).unwrap());
    }
}
