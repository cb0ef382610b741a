// SPDX-License-Identifier: MIT

pub mod expression;
pub mod loader;
pub mod node;
pub mod registry;
pub mod types;

pub use expression::{evaluate, parse, BoolOp, CompareExpression, CompareOp, ExpressionList};
pub use loader::ConstraintLoader;
pub use node::NodeAttributes;
pub use registry::{ConstraintDefinition, ConstraintRegistry};
pub use types::{ConstraintType, ConstraintValue, TypeCatalog};
