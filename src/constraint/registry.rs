// SPDX-License-Identifier: MIT

//! Known constraint names and their types
//!
//! The registry is consulted by the parser only and is never modified by
//! it. Names are case-folded on the way in.

use std::collections::HashMap;
use std::sync::Arc;

use crate::constraint::types::ConstraintType;
use crate::error::ConstraintError;

/// A constraint name bound to its declared type
#[derive(Debug, Clone)]
pub struct ConstraintDefinition {
    name: String,
    constraint_type: Arc<dyn ConstraintType>,
}

impl ConstraintDefinition {
    pub fn new(name: impl Into<String>, constraint_type: Arc<dyn ConstraintType>) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            constraint_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> &Arc<dyn ConstraintType> {
        &self.constraint_type
    }
}

impl PartialEq for ConstraintDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.constraint_type.name() == other.constraint_type.name()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    constraints: HashMap<String, ConstraintDefinition>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting names defined twice
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ConstraintDefinition>,
    ) -> Result<Self, ConstraintError> {
        let mut registry = Self::new();
        for definition in definitions {
            if registry.contains(definition.name()) {
                return Err(ConstraintError::DuplicateConstraint(
                    definition.name().to_string(),
                ));
            }
            registry.register(definition);
        }
        Ok(registry)
    }

    /// Add or replace a definition
    pub fn register(&mut self, definition: ConstraintDefinition) -> Option<ConstraintDefinition> {
        self.constraints
            .insert(definition.name().to_string(), definition)
    }

    /// Look up a definition; `name` is case-folded first
    pub fn get(&self, name: &str) -> Option<&ConstraintDefinition> {
        match self.constraints.get(name) {
            Some(definition) => Some(definition),
            None => self.constraints.get(&name.trim().to_lowercase()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintDefinition> {
        self.constraints.values()
    }
}
