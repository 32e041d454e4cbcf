//! Rule tree evaluator
//!
//! Evaluation is total: it never fails and never panics, whatever the tree
//! contains. Unknown condition types and missing values are simply not
//! satisfied.

use super::ast::{Condition, ConditionType, Group, Node, Operator};
use crate::criteria::snapshot::Snapshot;

/// Evaluate a rule tree against a participant snapshot
pub fn evaluate(tree: &Group, snapshot: &Snapshot) -> bool {
    evaluate_group(tree, snapshot)
}

/// Evaluate a single node
pub fn evaluate_node(node: &Node, snapshot: &Snapshot) -> bool {
    match node {
        Node::Group(group) => evaluate_group(group, snapshot),
        Node::Condition(condition) => evaluate_condition(condition, snapshot),
    }
}

fn evaluate_group(group: &Group, snapshot: &Snapshot) -> bool {
    // An empty group imposes no constraint, whatever its operator
    if group.conditions.is_empty() {
        return true;
    }

    match group.operator {
        Operator::And => group
            .conditions
            .iter()
            .all(|node| evaluate_node(node, snapshot)),
        Operator::Or => group
            .conditions
            .iter()
            .any(|node| evaluate_node(node, snapshot)),
    }
}

/// Evaluate a leaf condition
pub fn evaluate_condition(condition: &Condition, snapshot: &Snapshot) -> bool {
    if condition.condition_type.is_flag() && condition.key.is_empty() {
        return false;
    }

    let expected = condition.value.as_deref();
    match &condition.condition_type {
        ConditionType::FlagExists => snapshot.has_flag(&condition.key),
        ConditionType::FlagNotExists => !snapshot.has_flag(&condition.key),
        ConditionType::FlagHasValue => match (snapshot.flag(&condition.key), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            _ => false,
        },
        ConditionType::FlagNotHasValue => match expected {
            Some(expected) => snapshot.flag(&condition.key) != Some(expected),
            None => false,
        },
        ConditionType::HasStatus => expected == Some(snapshot.status()),
        ConditionType::Unknown(_) => false,
    }
}
