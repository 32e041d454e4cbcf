// SPDX-License-Identifier: MIT

//! Editing operations on a working copy of a rule tree
//!
//! Nested groups are addressed by a path of child indices from the root;
//! the empty path is the root itself.

use super::ast::{Condition, ConditionType, Group, Node, Operator};
use crate::criteria::error::{CriteriaError, Result};

/// Partial update of a leaf condition. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionUpdate {
    pub condition_type: Option<ConditionType>,
    pub key: Option<String>,
    pub value: Option<String>,
}

impl Group {
    /// Append a default leaf (`flagExists` with an empty key). Returns its index.
    pub fn add_condition(&mut self) -> usize {
        self.conditions.push(Node::Condition(Condition::default()));
        self.conditions.len() - 1
    }

    /// Append an empty AND group. Returns its index.
    pub fn add_group(&mut self) -> usize {
        self.conditions.push(Node::Group(Group::new(Operator::And)));
        self.conditions.len() - 1
    }

    /// Remove and return the child at `index`
    pub fn remove_item(&mut self, index: usize) -> Result<Node> {
        if index >= self.conditions.len() {
            return Err(CriteriaError::IndexOutOfRange {
                index,
                len: self.conditions.len(),
            });
        }
        Ok(self.conditions.remove(index))
    }

    pub fn update_group_operator(&mut self, operator: Operator) {
        self.operator = operator;
    }

    /// Navigate to the nested group at `path`
    pub fn group_at_mut(&mut self, path: &[usize]) -> Result<&mut Group> {
        let mut current = self;
        for (depth, &index) in path.iter().enumerate() {
            current = match current.conditions.get_mut(index) {
                Some(Node::Group(group)) => group,
                Some(Node::Condition(_)) => {
                    return Err(CriteriaError::invalid_path(
                        path,
                        format!("index {} at depth {} names a condition", index, depth),
                    ))
                }
                None => {
                    return Err(CriteriaError::invalid_path(
                        path,
                        format!("index {} at depth {} is out of range", index, depth),
                    ))
                }
            };
        }
        Ok(current)
    }

    /// Navigate to the leaf condition at `path`
    pub fn condition_at_mut(&mut self, path: &[usize]) -> Result<&mut Condition> {
        let (&last, parent_path) = path
            .split_last()
            .ok_or_else(|| CriteriaError::invalid_path(path, "the root is a group"))?;

        match self.group_at_mut(parent_path)?.conditions.get_mut(last) {
            Some(Node::Condition(condition)) => Ok(condition),
            Some(Node::Group(_)) => Err(CriteriaError::invalid_path(
                path,
                format!("index {} names a group", last),
            )),
            None => Err(CriteriaError::invalid_path(
                path,
                format!("index {} is out of range", last),
            )),
        }
    }
}

impl Condition {
    /// Apply a partial update
    pub fn update(&mut self, update: ConditionUpdate) {
        if let Some(condition_type) = update.condition_type {
            self.condition_type = condition_type;
        }
        if let Some(key) = update.key {
            self.key = key;
        }
        if let Some(value) = update.value {
            self.value = Some(value);
        }
    }
}
