// SPDX-License-Identifier: MIT

//! Typed error handling for nodeconstraint-rs
//!
//! Parsing failures carry the failing offset and the expression text,
//! evaluation failures are caller contract violations, and catalog
//! failures come from loading constraint definitions.

use thiserror::Error;

use crate::constraint::expression::CompareOp;

/// Top-level error type for nodeconstraint-rs
#[derive(Debug, Error)]
pub enum ConstraintError {
    /// Expression text could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Node attributes did not line up with the expression
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// A typed value could not be built
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Constraint name is not in the registry
    #[error("Unknown constraint '{0}'")]
    UnknownConstraint(String),

    /// Constraint type name is not known to the type catalog
    #[error("Unknown constraint type '{type_name}' for constraint '{name}'")]
    UnknownType { name: String, type_name: String },

    /// Same constraint name registered twice
    #[error("Constraint '{0}' is defined more than once")]
    DuplicateConstraint(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ConstraintError {
    /// Create an unknown type error
    pub fn unknown_type(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Failure to parse a constraint expression.
///
/// `offset` indexes the normalized expression text, `expression` holds that
/// text in its original case.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} @ {offset} while parsing '{expression}'")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
    pub expression: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize, expression: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            expression: expression.into(),
        }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

/// What went wrong while parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    /// Name not present in the registry
    #[error("unrecognised constraint '{0}'")]
    UnknownConstraint(String),

    /// Operator not legal for the constraint's type
    #[error("operator '{op}' is not supported by constraint type '{type_name}'")]
    UnsupportedOperator { op: CompareOp, type_name: String },

    /// No comparison or boolean operator where one was expected
    #[error("operator cannot be parsed")]
    MalformedOperator,

    /// Operand text does not fit the constraint's type
    #[error("malformed value: {0}")]
    MalformedValue(String),

    /// Stray or unclosed bracket
    #[error("improper brackets")]
    UnbalancedBrackets,

    /// A leaf ended before it was complete
    #[error("expression was not identified or is incomplete")]
    IncompleteExpression,
}

/// Errors raised by constraint type and value implementations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("operator '{op}' is not supported by constraint type '{type_name}'")]
    UnsupportedOperator { op: CompareOp, type_name: String },

    #[error("{0}")]
    Malformed(String),
}

impl ValueError {
    pub fn unsupported(op: CompareOp, type_name: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            op,
            type_name: type_name.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

impl From<ValueError> for ParseErrorKind {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::UnsupportedOperator { op, type_name } => {
                ParseErrorKind::UnsupportedOperator { op, type_name }
            }
            ValueError::Malformed(message) => ParseErrorKind::MalformedValue(message),
        }
    }
}

/// Evaluation errors. A missing attribute is never one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// Node reported a value of a different concrete type than the constraint declares
    #[error("Type mismatch for constraint '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_offset_and_text() {
        let err = ParseError::new(
            ParseErrorKind::UnknownConstraint("gpu".to_string()),
            0,
            "GPU && LINUX",
        );
        assert_eq!(
            err.to_string(),
            "unrecognised constraint 'gpu' @ 0 while parsing 'GPU && LINUX'"
        );
    }

    #[test]
    fn test_value_error_maps_to_parse_kind() {
        let kind: ParseErrorKind = ValueError::unsupported(CompareOp::In, "boolean").into();
        assert_eq!(
            kind,
            ParseErrorKind::UnsupportedOperator {
                op: CompareOp::In,
                type_name: "boolean".to_string()
            }
        );

        let kind: ParseErrorKind = ValueError::malformed("bad").into();
        assert_eq!(kind, ParseErrorKind::MalformedValue("bad".to_string()));
    }

    #[test]
    fn test_constraint_error_from_parse_error() {
        let err: ConstraintError =
            ParseError::new(ParseErrorKind::UnbalancedBrackets, 3, "(a").into();
        assert!(matches!(err, ConstraintError::Parse(_)));
    }
}
