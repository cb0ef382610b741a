// SPDX-License-Identifier: MIT

//! Constraint type library
//!
//! A constraint type knows which comparison operators are legal for it and
//! hands out empty values bound to one of those operators. The parser fills
//! a value from the expression text; the evaluator asks it whether a
//! node-reported value of the same concrete type satisfies it.
//!
//! Four types ship with the crate: `boolean`, `string`, `long` and `double`.
//! Callers add their own by implementing [`ConstraintType`] and
//! [`ConstraintValue`] and registering the type in a [`TypeCatalog`].

mod boolean;
mod double;
mod long;
mod string;

pub use boolean::{BooleanType, BooleanValue};
pub use double::{DoubleType, DoubleValue};
pub use long::{LongType, LongValue};
pub use string::{StringSetType, StringSetValue};

use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::constraint::expression::CompareOp;
use crate::error::ValueError;

/// Capability set of a constraint type
pub trait ConstraintType: fmt::Debug + Send + Sync {
    /// Type identity, also used for structural equality
    fn name(&self) -> &str;

    /// Operators this type accepts
    fn supported_ops(&self) -> &[CompareOp];

    fn supports(&self, op: CompareOp) -> bool {
        self.supported_ops().contains(&op)
    }

    /// Empty value bound to `op`
    fn new_value(&self, op: CompareOp) -> Result<Box<dyn ConstraintValue>, ValueError>;
}

/// A typed operand bound to one comparison operator
pub trait ConstraintValue: fmt::Debug + fmt::Display + Send + Sync {
    /// Name of the constraint type this value belongs to
    fn type_name(&self) -> &str;

    /// Operator the value was created for
    fn op(&self) -> CompareOp;

    /// Parse the operand starting at byte `offset` of `text` and return the
    /// offset just past it.
    fn parse(&mut self, text: &str, offset: usize) -> Result<usize, ValueError>;

    /// Whether a node-reported value satisfies this operand. `None` when the
    /// node value is of another concrete type.
    fn matches(&self, node_value: &dyn ConstraintValue) -> Option<bool>;

    fn as_any(&self) -> &dyn Any;

    /// Structural equality across trait objects
    fn value_eq(&self, other: &dyn ConstraintValue) -> bool;
}

impl PartialEq for dyn ConstraintValue {
    fn eq(&self, other: &Self) -> bool {
        self.value_eq(other)
    }
}

/// Downcast a value to its concrete type
pub fn downcast<T: 'static>(value: &dyn ConstraintValue) -> Option<&T> {
    value.as_any().downcast_ref::<T>()
}

/// Parsed operand of the built-in ordered types
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Operand<T> {
    #[default]
    Unset,
    Scalar(T),
    Set(Vec<T>),
}

impl<T: fmt::Display> fmt::Display for Operand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Unset => write!(f, "?"),
            Operand::Scalar(v) => write!(f, "{}", v),
            Operand::Set(values) => write_set(f, values),
        }
    }
}

pub(crate) fn write_set<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    values: impl IntoIterator<Item = T>,
) -> fmt::Result {
    write!(f, "(")?;
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    write!(f, ")")
}

/// Scalar operand: runs up to the next space, `)` or end of text.
pub fn scalar_operand(text: &str, offset: usize) -> Result<(&str, usize), ValueError> {
    let bytes = text.as_bytes();
    if offset >= bytes.len() {
        return Err(ValueError::malformed(format!("missing value @ {}", offset)));
    }
    let end = bytes[offset..]
        .iter()
        .position(|b| *b == b' ' || *b == b')')
        .map_or(bytes.len(), |p| offset + p);
    let token = text
        .get(offset..end)
        .ok_or_else(|| ValueError::malformed(format!("invalid value boundary @ {}", offset)))?;
    if token.is_empty() {
        return Err(ValueError::malformed(format!("missing value @ {}", offset)));
    }
    Ok((token, end))
}

/// Set operand: `( a, b, c )`, ends at the first `)`.
pub fn set_operand(text: &str, offset: usize) -> Result<(Vec<&str>, usize), ValueError> {
    let bytes = text.as_bytes();
    if bytes.get(offset) != Some(&b'(') {
        return Err(ValueError::malformed(format!(
            "expected '(' to start a value set @ {}",
            offset
        )));
    }
    let close = bytes[offset + 1..]
        .iter()
        .position(|b| *b == b')')
        .map(|p| offset + 1 + p)
        .ok_or_else(|| ValueError::malformed(format!("unclosed value set @ {}", offset)))?;
    let inner = text
        .get(offset + 1..close)
        .ok_or_else(|| ValueError::malformed(format!("invalid value set @ {}", offset)))?;
    if inner.contains('(') {
        return Err(ValueError::malformed(format!(
            "nested bracket in value set @ {}",
            offset
        )));
    }
    let entries: Vec<&str> = inner.split(',').map(str::trim).collect();
    if entries.iter().any(|e| e.is_empty()) {
        return Err(ValueError::malformed(format!(
            "empty entry in value set @ {}",
            offset
        )));
    }
    Ok((entries, close + 1))
}

/// Parse a scalar or a set operand, depending on `op`
pub fn parse_operand<T, F>(
    text: &str,
    offset: usize,
    op: CompareOp,
    parse_one: F,
) -> Result<(Operand<T>, usize), ValueError>
where
    F: Fn(&str) -> Result<T, ValueError>,
{
    if op.takes_set() {
        let (entries, end) = set_operand(text, offset)?;
        let values = entries
            .into_iter()
            .map(&parse_one)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((Operand::Set(values), end))
    } else {
        let (token, end) = scalar_operand(text, offset)?;
        Ok((Operand::Scalar(parse_one(token)?), end))
    }
}

/// Apply an ordering/membership operator: does `node` satisfy `op operand`?
pub fn compare_ordered<T: PartialOrd>(op: CompareOp, node: &T, operand: &Operand<T>) -> bool {
    match (op, operand) {
        (CompareOp::LessThan, Operand::Scalar(v)) => node < v,
        (CompareOp::LessOrEqual, Operand::Scalar(v)) => node <= v,
        (CompareOp::Equal, Operand::Scalar(v)) => node == v,
        (CompareOp::NotEqual, Operand::Scalar(v)) => node != v,
        (CompareOp::GreaterOrEqual, Operand::Scalar(v)) => node >= v,
        (CompareOp::GreaterThan, Operand::Scalar(v)) => node > v,
        (CompareOp::In, Operand::Set(values)) => values.iter().any(|v| v == node),
        (CompareOp::NotIn, Operand::Set(values)) => !values.iter().any(|v| v == node),
        (CompareOp::Exists, _) | (CompareOp::NotExists, _) => true,
        _ => false,
    }
}

pub(crate) const ALL_OPS: [CompareOp; 10] = [
    CompareOp::LessThan,
    CompareOp::LessOrEqual,
    CompareOp::Equal,
    CompareOp::NotEqual,
    CompareOp::GreaterOrEqual,
    CompareOp::GreaterThan,
    CompareOp::In,
    CompareOp::NotIn,
    CompareOp::Exists,
    CompareOp::NotExists,
];

/// Name → constraint type lookup used when loading constraint catalogs
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    types: HashMap<String, Arc<dyn ConstraintType>>,
}

/// The built-in types, shared by every leaf that references them
pub static BUILTIN_TYPES: Lazy<TypeCatalog> = Lazy::new(TypeCatalog::with_builtins);

impl TypeCatalog {
    /// A catalog with no types at all
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// A catalog holding the four built-in types and their aliases
    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty();
        catalog.register_as("bool", boolean());
        catalog.register(boolean());
        catalog.register_as("str", string());
        catalog.register_as("string_set", string());
        catalog.register(string());
        catalog.register_as("int", long());
        catalog.register_as("integer", long());
        catalog.register(long());
        catalog.register_as("float", double());
        catalog.register(double());
        catalog
    }

    /// Register a type under its own name
    pub fn register(&mut self, constraint_type: Arc<dyn ConstraintType>) {
        let name = constraint_type.name().to_lowercase();
        self.types.insert(name, constraint_type);
    }

    /// Register a type under an alias
    pub fn register_as(&mut self, alias: &str, constraint_type: Arc<dyn ConstraintType>) {
        self.types.insert(alias.to_lowercase(), constraint_type);
    }

    /// Look a type up by (case-insensitive) name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ConstraintType>> {
        self.types.get(&name.trim().to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&name.trim().to_lowercase())
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        BUILTIN_TYPES.clone()
    }
}

static BOOLEAN: Lazy<Arc<dyn ConstraintType>> = Lazy::new(|| Arc::new(BooleanType));
static STRING: Lazy<Arc<dyn ConstraintType>> = Lazy::new(|| Arc::new(StringSetType));
static LONG: Lazy<Arc<dyn ConstraintType>> = Lazy::new(|| Arc::new(LongType));
static DOUBLE: Lazy<Arc<dyn ConstraintType>> = Lazy::new(|| Arc::new(DoubleType));

/// Shared instance of the boolean type
pub fn boolean() -> Arc<dyn ConstraintType> {
    BOOLEAN.clone()
}

/// Shared instance of the string-set type
pub fn string() -> Arc<dyn ConstraintType> {
    STRING.clone()
}

/// Shared instance of the 64-bit integer type
pub fn long() -> Arc<dyn ConstraintType> {
    LONG.clone()
}

/// Shared instance of the floating-point type
pub fn double() -> Arc<dyn ConstraintType> {
    DOUBLE.clone()
}
