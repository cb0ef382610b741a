// SPDX-License-Identifier: MIT

//! Typed constraint expressions matched against node attributes
//!
//! ```
//! use nodeconstraint_rs::constraint::{
//!     evaluate, parse, types, ConstraintDefinition, ConstraintRegistry, NodeAttributes,
//! };
//! use nodeconstraint_rs::constraint::types::LongValue;
//!
//! let registry = ConstraintRegistry::from_definitions([
//!     ConstraintDefinition::new("num_of_disks", types::long()),
//!     ConstraintDefinition::new("has_ssd", types::boolean()),
//! ])?;
//! let tree = parse("NUM_OF_DISKS >= 3 || HAS_SSD", &registry)?.unwrap_or_default();
//!
//! let mut node = NodeAttributes::new();
//! node.insert("num_of_disks", LongValue::reported(4));
//! assert!(evaluate(&tree, &node)?);
//! # Ok::<(), nodeconstraint_rs::error::ConstraintError>(())
//! ```

pub mod constraint;
pub mod error;

pub use error::ConstraintError;
