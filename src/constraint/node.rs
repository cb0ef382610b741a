// SPDX-License-Identifier: MIT

//! Attributes reported by one node, the input to evaluation

use std::collections::HashMap;
use std::fmt;

use crate::constraint::expression::CompareOp;
use crate::constraint::registry::ConstraintRegistry;
use crate::constraint::types::ConstraintValue;
use crate::error::{ConstraintError, ValueError};

/// Node attribute map keyed by case-folded constraint name
#[derive(Default)]
pub struct NodeAttributes {
    values: HashMap<String, Box<dyn ConstraintValue>>,
}

impl NodeAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute to an already typed value
    pub fn insert(
        &mut self,
        name: &str,
        value: impl ConstraintValue + 'static,
    ) -> Option<Box<dyn ConstraintValue>> {
        self.values.insert(name.trim().to_lowercase(), Box::new(value))
    }

    /// Set an attribute from its textual form, typed by the registry.
    ///
    /// The text is case-folded and parsed the way an `==` operand would be.
    pub fn insert_text(
        &mut self,
        registry: &ConstraintRegistry,
        name: &str,
        text: &str,
    ) -> Result<(), ConstraintError> {
        let definition = registry
            .get(name)
            .ok_or_else(|| ConstraintError::UnknownConstraint(name.to_string()))?;
        let text = text.trim().to_lowercase();
        let mut value = definition.constraint_type().new_value(CompareOp::Equal)?;
        let end = value.parse(&text, 0)?;
        if end != text.len() {
            return Err(ValueError::malformed(format!(
                "unexpected trailing text in value '{}' of '{}'",
                text, name
            ))
            .into());
        }
        self.values.insert(definition.name().to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn ConstraintValue>> {
        self.values.remove(&name.trim().to_lowercase())
    }

    /// Look an attribute up by name
    pub fn get(&self, name: &str) -> Option<&dyn ConstraintValue> {
        match self.values.get(name) {
            Some(value) => Some(&**value),
            None => self
                .values
                .get(&name.trim().to_lowercase())
                .map(|v| &**v),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get all attribute names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

impl fmt::Debug for NodeAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.values.iter().map(|(k, v)| (k, v.to_string())))
            .finish()
    }
}
