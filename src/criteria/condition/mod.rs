// SPDX-License-Identifier: MIT

//! Participant inclusion/exclusion rule trees
//!
//! This module provides the condition tree model, its persisted JSON form,
//! editing operations and the evaluator. A tree looks like:
//! - `{"operator": "AND", "conditions": [...]}` for groups
//! - `{"type": "hasStatus", "key": "", "value": "active"}` for leaves

mod ast;
mod editor;
mod evaluator;
mod parser;
mod validate;

pub use ast::{Condition, ConditionType, Group, Node, Operator, UnknownTypeName};
pub use editor::ConditionUpdate;
pub use evaluator::{evaluate, evaluate_condition, evaluate_node};
pub use parser::{
    parse, parse_criteria, parse_inline, parse_value, serialize, to_criteria_string,
};
pub use validate::{validate, IssueKind, RuleIssue, ValidationOptions, STATUS_VALUES_ENV};
