// SPDX-License-Identifier: MIT

//! Constraint expressions over node attributes
//!
//! Expressions combine typed comparisons with `&&` and `||`:
//! - `HAS_GPU`
//! - `NUM_OF_DISKS >= 3 || HAS_SSD`
//! - `(JDK_TYPE IN (OPEN_JDK, ORACLE_JDK) && GLIBC > 2.12) && !WINDOWS`
//!
//! Grouping is strictly left to right with no operator precedence.

mod ast;
mod evaluator;
mod parser;

pub use ast::{BoolOp, CompareExpression, CompareOp, Expression, ExpressionList};
pub use evaluator::{evaluate, evaluate_expression};
pub use parser::{normalize, parse};
