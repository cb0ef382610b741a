// SPDX-License-Identifier: MIT

//! Constraint loader - YAML catalog and node attribute loading
//!
//! A catalog declares which constraint names exist and their types. A node
//! file is a flat map of attribute names to scalar values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::node::NodeAttributes;
use super::registry::{ConstraintDefinition, ConstraintRegistry};
use super::types::TypeCatalog;
use crate::error::{ConstraintError, ValueError};

/// On-disk form of a constraint catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogFile {
    #[serde(default)]
    pub constraints: Vec<CatalogEntry>,
}

/// One declared constraint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Loads constraint catalogs and node attributes from YAML files
pub struct ConstraintLoader {
    types: TypeCatalog,
}

impl ConstraintLoader {
    /// A loader that knows the built-in types
    pub fn new() -> Self {
        Self {
            types: TypeCatalog::default(),
        }
    }

    /// A loader resolving type names through the given catalog
    pub fn with_types(types: TypeCatalog) -> Self {
        Self { types }
    }

    /// Load a constraint registry from a YAML file
    pub fn load_catalog<P: AsRef<Path>>(&self, path: P) -> Result<ConstraintRegistry, ConstraintError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let registry = self.parse_catalog_yaml(&content)?;
        log::info!(
            "Loaded {} constraint(s) from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parse a constraint registry from a YAML string
    pub fn parse_catalog_yaml(&self, content: &str) -> Result<ConstraintRegistry, ConstraintError> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        let definitions = file
            .constraints
            .into_iter()
            .map(|entry| {
                self.types
                    .get(&entry.type_name)
                    .map(|ty| ConstraintDefinition::new(entry.name.as_str(), ty))
                    .ok_or_else(|| ConstraintError::unknown_type(entry.name, entry.type_name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        ConstraintRegistry::from_definitions(definitions)
    }

    /// Load node attributes from a YAML file
    pub fn load_node<P: AsRef<Path>>(
        &self,
        path: P,
        registry: &ConstraintRegistry,
    ) -> Result<NodeAttributes, ConstraintError> {
        let content = fs::read_to_string(path)?;
        Self::parse_node_yaml(&content, registry)
    }

    /// Parse node attributes from a YAML string.
    ///
    /// Names missing from the registry are skipped.
    pub fn parse_node_yaml(
        content: &str,
        registry: &ConstraintRegistry,
    ) -> Result<NodeAttributes, ConstraintError> {
        let raw: Option<BTreeMap<String, serde_yaml::Value>> = serde_yaml::from_str(content)?;
        let mut node = NodeAttributes::new();
        for (name, value) in raw.unwrap_or_default() {
            if !registry.contains(&name) {
                log::warn!("Skipping node attribute '{}': not a known constraint", name);
                continue;
            }
            let text = scalar_text(&name, &value)?;
            node.insert_text(registry, &name, &text)?;
        }
        Ok(node)
    }
}

impl Default for ConstraintLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn scalar_text(name: &str, value: &serde_yaml::Value) -> Result<String, ValueError> {
    match value {
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::String(s) => Ok(s.clone()),
        _ => Err(ValueError::malformed(format!(
            "node attribute '{}' must be a scalar",
            name
        ))),
    }
}
