// SPDX-License-Identifier: MIT

//! Constraint expression parser
//!
//! Parses expressions of the form
//! `compareExpression [boolOp compareExpression]...` where a compare
//! expression is `name [compareOp value]`:
//! - `num_of_disks >= 3`
//! - `jdk_type in (open_jdk, oracle_jdk)`
//! - `(num_of_disks >= 3 || has_ssd) && !windows`
//!
//! A bare name means EXISTS, `!name` means NOT_EXISTS. Operators must be
//! surrounded by single spaces; the input is normalized first so runs of
//! whitespace collapse to one space.
//!
//! There is no AND-over-OR precedence. Operators group strictly left to
//! right: the first run of one boolean operator forms a list, and as soon as
//! a different operator follows, or a bracket has just closed, the whole
//! list so far becomes the single first child of a new list. So
//! `a && b || c` is `(a && b) || c` and `a || b && c` is `(a || b) && c`.
//! Use brackets to group anything else.

use std::sync::Arc;

use super::ast::{BoolOp, CompareExpression, CompareOp, ExpressionList};
use crate::constraint::registry::ConstraintRegistry;
use crate::constraint::types::{ConstraintType, ConstraintValue};
use crate::error::{ParseError, ParseErrorKind};

/// Parse `expression` against the constraints in `registry`.
///
/// Returns `Ok(None)` when the expression is empty or only whitespace.
pub fn parse(
    expression: &str,
    registry: &ConstraintRegistry,
) -> Result<Option<ExpressionList>, ParseError> {
    let normalized = normalize(expression);
    if normalized.is_empty() {
        return Ok(None);
    }

    let tree = Parser::new(&normalized, registry).run()?;
    log::debug!(
        "Parsed constraint expression '{}' into {} leaves",
        normalized,
        tree.leaf_count()
    );
    Ok(Some(tree))
}

/// Trim and collapse every run of whitespace into one space
pub fn normalize(expression: &str) -> String {
    expression.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning a constraint name
    Constraint,
    /// Expecting a comparison operator
    CompareOp,
    /// Expecting an operand
    Value,
    /// Expecting `&&` / `and` / `||` / `or`
    Op,
}

/// Leaf under construction
struct PendingLeaf {
    name: String,
    constraint_type: Arc<dyn ConstraintType>,
    op: CompareOp,
    value: Option<Box<dyn ConstraintValue>>,
    value_parsed: bool,
    must_exist: bool,
}

/// Single-use parse state; lives for one `parse` call.
struct Parser<'a> {
    /// Normalized expression in its original case, for error messages
    expression: &'a str,
    /// ASCII-lowercased copy that is actually scanned; byte offsets match
    /// `expression`
    text: String,
    registry: &'a ConstraintRegistry,
    offset: usize,
    /// Start of the name currently being scanned
    token_start: usize,
    state: State,
    /// Enclosing lists, one per open bracket
    stack: Vec<Option<ExpressionList>>,
    list: Option<ExpressionList>,
    current: Option<PendingLeaf>,
    not_exists: bool,
    closed_bracket: bool,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str, registry: &'a ConstraintRegistry) -> Self {
        Self {
            expression,
            text: expression.to_ascii_lowercase(),
            registry,
            offset: 0,
            token_start: 0,
            state: State::Constraint,
            stack: Vec::new(),
            list: None,
            current: None,
            not_exists: false,
            closed_bracket: false,
        }
    }

    fn run(mut self) -> Result<ExpressionList, ParseError> {
        while self.offset < self.text.len() {
            let c = self.text.as_bytes()[self.offset];
            match c {
                b'!' if self.state == State::Constraint => self.handle_not(),
                b' ' => self.handle_space()?,
                b'(' => self.handle_opening_bracket()?,
                b')' => {
                    self.handle_closing_bracket()?;
                    self.closed_bracket = true;
                }
                _ => match self.state {
                    State::CompareOp => self.parse_compare_op()?,
                    State::Op => {
                        self.parse_bool_op()?;
                        self.closed_bracket = false;
                    }
                    // part of a name
                    State::Constraint | State::Value => self.offset += 1,
                },
            }
        }
        self.finish()
    }

    fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError::new(kind, offset, self.expression)
    }

    fn scanned_name(&self) -> &str {
        self.text.get(self.token_start..self.offset).unwrap_or("")
    }

    fn handle_not(&mut self) {
        // only a marker in front of a name; inside a name it is just a character
        if self.token_start == self.offset {
            self.not_exists = true;
            self.token_start += 1;
        }
        self.offset += 1;
    }

    fn handle_space(&mut self) -> Result<(), ParseError> {
        match self.state {
            State::Constraint => {
                if self.token_start == self.offset {
                    self.token_start += 1;
                    self.offset += 1;
                    return Ok(());
                }
                if self.current.is_some() {
                    return Err(self.error(ParseErrorKind::MalformedOperator, self.offset));
                }
                let name = self.scanned_name().to_string();
                self.current = Some(self.open_leaf(&name)?);
                self.state = State::CompareOp;
                self.offset += 1;
            }
            State::Value => {
                self.offset += 1;
                self.parse_value()?;
                self.token_start = self.offset;
                self.state = State::Op;
            }
            State::CompareOp | State::Op => self.offset += 1,
        }
        Ok(())
    }

    fn parse_value(&mut self) -> Result<(), ParseError> {
        let start = self.offset;
        let expression = self.expression;
        let incomplete = || ParseError::new(ParseErrorKind::IncompleteExpression, start, expression);

        // operator with no operand after it
        if matches!(self.text.as_bytes().get(start), None | Some(b')')) {
            return Err(incomplete());
        }
        let leaf = self.current.as_mut().ok_or_else(incomplete)?;
        let value = leaf.value.as_mut().ok_or_else(incomplete)?;
        let end = value
            .parse(&self.text, start)
            .map_err(|e| ParseError::new(e.into(), start, expression))?;
        if end <= start || end > self.text.len() {
            return Err(ParseError::new(
                ParseErrorKind::MalformedValue(format!("value parser stopped at {}", end)),
                start,
                expression,
            ));
        }
        leaf.value_parsed = true;
        self.offset = end;
        Ok(())
    }

    fn open_leaf(&mut self, name: &str) -> Result<PendingLeaf, ParseError> {
        let registry = self.registry;
        let definition = registry.get(name).ok_or_else(|| {
            self.error(
                ParseErrorKind::UnknownConstraint(name.to_string()),
                self.token_start,
            )
        })?;
        let not_exists = std::mem::take(&mut self.not_exists);
        Ok(PendingLeaf {
            name: definition.name().to_string(),
            constraint_type: definition.constraint_type().clone(),
            op: if not_exists {
                CompareOp::NotExists
            } else {
                CompareOp::Exists
            },
            value: None,
            value_parsed: false,
            must_exist: !not_exists,
        })
    }

    fn handle_opening_bracket(&mut self) -> Result<(), ParseError> {
        if self.state != State::Constraint || self.token_start != self.offset {
            return Err(self.error(ParseErrorKind::UnbalancedBrackets, self.offset));
        }
        // `!` marks a single leaf, never a bracketed group
        if self.not_exists {
            return Err(self.error(ParseErrorKind::MalformedOperator, self.offset));
        }
        self.offset += 1;
        self.token_start = self.offset;
        self.stack.push(self.list.take());
        Ok(())
    }

    fn handle_closing_bracket(&mut self) -> Result<(), ParseError> {
        if self.state == State::CompareOp || self.stack.is_empty() {
            return Err(self.error(ParseErrorKind::UnbalancedBrackets, self.offset));
        }

        match self.state {
            State::Constraint => {
                if self.token_start == self.offset {
                    return Err(self.error(ParseErrorKind::IncompleteExpression, self.offset));
                }
                if self.current.is_none() {
                    let name = self.scanned_name().to_string();
                    self.current = Some(self.open_leaf(&name)?);
                }
                self.state = State::Op;
            }
            State::Value => self.state = State::Op,
            State::CompareOp | State::Op => {}
        }

        if self.current.is_some() {
            let leaf = self.finish_leaf()?;
            self.list
                .get_or_insert_with(|| ExpressionList::new(BoolOp::And))
                .push(leaf);
        } else if !self.closed_bracket {
            return Err(self.error(ParseErrorKind::IncompleteExpression, self.offset));
        }

        // merge the bracketed list into the enclosing one
        if let Some(Some(mut outer)) = self.stack.pop() {
            if let Some(inner) = self.list.take() {
                outer.push(inner);
            }
            self.list = Some(outer);
        }
        self.offset += 1;
        self.token_start = self.offset;
        Ok(())
    }

    fn parse_compare_op(&mut self) -> Result<(), ParseError> {
        let offset = self.offset;
        let expression = self.expression;
        let rest = &self.text.as_bytes()[offset..];

        let Some((op, width)) = match_compare_op(rest) else {
            // a bare name directly followed by a boolean operator
            let bare = self
                .current
                .as_ref()
                .is_some_and(|leaf| leaf.op.is_existence());
            if bare && match_bool_op(rest).is_some() {
                self.state = State::Op;
                return self.parse_bool_op();
            }
            if is_trailing_compare_op(rest) {
                return Err(self.error(ParseErrorKind::IncompleteExpression, offset));
            }
            return Err(self.error(ParseErrorKind::MalformedOperator, offset));
        };

        let leaf = self
            .current
            .as_mut()
            .ok_or_else(|| ParseError::new(ParseErrorKind::IncompleteExpression, offset, expression))?;
        if !leaf.constraint_type.supports(op) {
            return Err(ParseError::new(
                ParseErrorKind::UnsupportedOperator {
                    op,
                    type_name: leaf.constraint_type.name().to_string(),
                },
                offset,
                expression,
            ));
        }
        let value = leaf
            .constraint_type
            .new_value(op)
            .map_err(|e| ParseError::new(e.into(), offset, expression))?;
        leaf.op = op;
        leaf.must_exist = op != CompareOp::NotEqual;
        leaf.value = Some(value);
        leaf.value_parsed = false;

        self.offset += width;
        self.token_start = self.offset;
        self.state = State::Value;
        Ok(())
    }

    fn parse_bool_op(&mut self) -> Result<(), ParseError> {
        let (op, width) = match_bool_op(&self.text.as_bytes()[self.offset..])
            .ok_or_else(|| self.error(ParseErrorKind::MalformedOperator, self.offset))?;

        let mut list = self.list.take().unwrap_or_else(|| ExpressionList::new(op));
        // after a closing bracket the pending leaf has already been added
        if !self.closed_bracket {
            list.push(self.finish_leaf()?);
        }
        if self.closed_bracket || (list.len() > 1 && list.op() != op) {
            list = ExpressionList::with_children(op, vec![list.into()]);
        }
        self.list = Some(list);

        self.offset += width;
        self.token_start = self.offset;
        self.state = State::Constraint;
        Ok(())
    }

    fn finish_leaf(&mut self) -> Result<CompareExpression, ParseError> {
        let leaf = self
            .current
            .take()
            .ok_or_else(|| self.error(ParseErrorKind::IncompleteExpression, self.offset))?;

        if leaf.op.is_existence() {
            if !leaf.constraint_type.supports(leaf.op) {
                return Err(self.error(
                    ParseErrorKind::UnsupportedOperator {
                        op: leaf.op,
                        type_name: leaf.constraint_type.name().to_string(),
                    },
                    self.offset,
                ));
            }
        } else if !leaf.value_parsed {
            return Err(self.error(ParseErrorKind::IncompleteExpression, self.offset));
        }

        let value = if leaf.op.is_existence() {
            None
        } else {
            leaf.value
        };
        Ok(
            CompareExpression::new(leaf.name, leaf.constraint_type, leaf.op, value)
                .with_must_exist(leaf.must_exist),
        )
    }

    fn finish(mut self) -> Result<ExpressionList, ParseError> {
        if !self.stack.is_empty() {
            return Err(self.error(ParseErrorKind::UnbalancedBrackets, self.offset));
        }

        if self.state == State::Constraint && self.token_start < self.offset {
            if self.current.is_some() {
                return Err(self.error(ParseErrorKind::MalformedOperator, self.token_start));
            }
            let name = self.scanned_name().to_string();
            self.current = Some(self.open_leaf(&name)?);
        }

        if self.current.is_some() {
            let leaf = self.finish_leaf()?;
            self.list
                .get_or_insert_with(|| ExpressionList::new(BoolOp::And))
                .push(leaf);
        } else if !self.closed_bracket {
            return Err(self.error(ParseErrorKind::IncompleteExpression, self.offset));
        }

        Ok(self.list.unwrap_or_default())
    }
}

/// Recognize `||` / `or` / `&&` / `and` (each followed by a space)
fn match_bool_op(rest: &[u8]) -> Option<(BoolOp, usize)> {
    if rest.starts_with(b"|| ") || rest.starts_with(b"or ") {
        Some((BoolOp::Or, 3))
    } else if rest.starts_with(b"and ") {
        Some((BoolOp::And, 4))
    } else if rest.starts_with(b"&& ") {
        Some((BoolOp::And, 3))
    } else {
        None
    }
}

/// Recognize a comparison operator at the start of `rest`, returning the
/// operator and the width of its token.
fn match_compare_op(rest: &[u8]) -> Option<(CompareOp, usize)> {
    if rest.len() > 2 && rest[2] == b' ' {
        let op = match &rest[..2] {
            b"eq" | b"==" => Some(CompareOp::Equal),
            b"ne" | b"!=" => Some(CompareOp::NotEqual),
            b"lt" => Some(CompareOp::LessThan),
            b"le" | b"<=" => Some(CompareOp::LessOrEqual),
            b"gt" => Some(CompareOp::GreaterThan),
            b"ge" | b">=" => Some(CompareOp::GreaterOrEqual),
            b"in" => Some(CompareOp::In),
            _ => None,
        };
        if let Some(op) = op {
            return Some((op, 2));
        }
    }
    if rest.starts_with(b"ene ") {
        Some((CompareOp::NotEqual, 3))
    } else if rest.starts_with(b"< ") {
        Some((CompareOp::LessThan, 1))
    } else if rest.starts_with(b"> ") {
        Some((CompareOp::GreaterThan, 1))
    } else if rest.starts_with(b"not_in ") {
        Some((CompareOp::NotIn, 6))
    } else {
        None
    }
}

/// A comparison operator that ends the input, e.g. `num_of_disks >=`
fn is_trailing_compare_op(rest: &[u8]) -> bool {
    const TOKENS: [&[u8]; 15] = [
        b"==", b"!=", b"<=", b">=", b"<", b">", b"eq", b"ne", b"ene", b"lt", b"le", b"gt", b"ge",
        b"in", b"not_in",
    ];
    TOKENS.contains(&rest)
}
