// SPDX-License-Identifier: MIT

//! Advisory checks on a rule tree before it is persisted
//!
//! Validation never rejects a tree; evaluation already treats every issue
//! reported here as "not satisfied". It exists so the person editing the
//! rules can see why a condition will never match.

use super::ast::{Condition, ConditionType, Group, Node};
use std::fmt;

/// Environment variable overriding the accepted status values
pub const STATUS_VALUES_ENV: &str = "CRITERIA_STATUS_VALUES";

const DEFAULT_STATUS_VALUES: &[&str] = &["active", "temporary"];

/// Validation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Status values a `hasStatus` condition may compare against
    pub status_values: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            status_values: DEFAULT_STATUS_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ValidationOptions {
    /// Read status values from `CRITERIA_STATUS_VALUES` (comma-separated),
    /// falling back to the defaults
    pub fn from_env() -> Self {
        match std::env::var(STATUS_VALUES_ENV) {
            Ok(raw) => Self::with_status_values(&raw),
            Err(_) => Self::default(),
        }
    }

    /// Parse a comma-separated status list. A blank list keeps the defaults.
    pub fn with_status_values(raw: &str) -> Self {
        let status_values: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if status_values.is_empty() {
            Self::default()
        } else {
            Self { status_values }
        }
    }
}

/// A problem found in one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIssue {
    /// JSON path of the node, e.g. `$.conditions[1]`
    pub path: String,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Flag condition without a key
    EmptyKey,
    /// Comparison condition without a value
    MissingValue,
    UnknownType(String),
    /// `hasStatus` value outside the configured status list
    UnknownStatus(String),
    /// Nested group without children
    EmptyGroup,
    /// Exclusion condition without a key; it never matches
    EmptyExclusionKey,
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::EmptyKey => write!(f, "{}: flag condition has an empty key", self.path),
            IssueKind::MissingValue => write!(f, "{}: condition has no value", self.path),
            IssueKind::UnknownType(name) => {
                write!(f, "{}: unknown condition type \"{}\"", self.path, name)
            }
            IssueKind::UnknownStatus(status) => {
                write!(f, "{}: unknown status \"{}\"", self.path, status)
            }
            IssueKind::EmptyGroup => write!(f, "{}: group has no conditions", self.path),
            IssueKind::EmptyExclusionKey => write!(
                f,
                "{}: exclusion condition has an empty key and never matches",
                self.path
            ),
        }
    }
}

/// Check a rule tree. An empty root is not an issue: it means "include all".
pub fn validate(tree: &Group, options: &ValidationOptions) -> Vec<RuleIssue> {
    let mut issues = Vec::new();
    check_children(tree, "$", options, &mut issues);
    issues
}

fn check_children(
    group: &Group,
    path: &str,
    options: &ValidationOptions,
    issues: &mut Vec<RuleIssue>,
) {
    for (i, node) in group.conditions.iter().enumerate() {
        let child_path = format!("{}.conditions[{}]", path, i);
        match node {
            Node::Group(inner) => {
                if inner.conditions.is_empty() {
                    issues.push(RuleIssue {
                        path: child_path.clone(),
                        kind: IssueKind::EmptyGroup,
                    });
                }
                check_children(inner, &child_path, options, issues);
            }
            Node::Condition(condition) => check_condition(condition, child_path, options, issues),
        }
    }
}

fn check_condition(
    condition: &Condition,
    path: String,
    options: &ValidationOptions,
    issues: &mut Vec<RuleIssue>,
) {
    let ty = &condition.condition_type;

    if let ConditionType::Unknown(name) = ty {
        issues.push(RuleIssue {
            path,
            kind: IssueKind::UnknownType(name.as_str().to_string()),
        });
        return;
    }

    if ty.is_flag() && condition.key.is_empty() {
        issues.push(RuleIssue {
            path: path.clone(),
            kind: IssueKind::EmptyKey,
        });
    }

    match (&condition.value, ty.requires_value()) {
        (None, true) => issues.push(RuleIssue {
            path,
            kind: IssueKind::MissingValue,
        }),
        (Some(status), _) if *ty == ConditionType::HasStatus => {
            if !options.status_values.iter().any(|s| s == status) {
                issues.push(RuleIssue {
                    path,
                    kind: IssueKind::UnknownStatus(status.clone()),
                });
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::condition::ast::Operator;

    fn kinds(tree: &Group) -> Vec<(String, IssueKind)> {
        validate(tree, &ValidationOptions::default())
            .into_iter()
            .map(|issue| (issue.path, issue.kind))
            .collect()
    }

    #[test]
    fn test_valid_tree_has_no_issues() {
        let tree = Group::or(vec![
            Condition::flag_exists("vip").into(),
            Group::and(vec![
                Condition::has_status("active").into(),
                Condition::flag_not_has_value("site", "b").into(),
            ])
            .into(),
        ]);
        assert!(kinds(&tree).is_empty());
    }

    #[test]
    fn test_empty_root_is_fine() {
        assert!(kinds(&Group::default()).is_empty());
    }

    #[test]
    fn test_reports_each_issue_with_path() {
        let tree = Group::and(vec![
            Condition::flag_exists("").into(),
            Condition::new(ConditionType::FlagHasValue, "a", None).into(),
            Group::or(vec![
                Condition::new(ConditionType::from_name("bogus"), "", None).into(),
                Condition::has_status("retired").into(),
                Group::new(Operator::And).into(),
            ])
            .into(),
        ]);

        assert_eq!(
            kinds(&tree),
            vec![
                ("$.conditions[0]".to_string(), IssueKind::EmptyKey),
                ("$.conditions[1]".to_string(), IssueKind::MissingValue),
                (
                    "$.conditions[2].conditions[0]".to_string(),
                    IssueKind::UnknownType("bogus".to_string())
                ),
                (
                    "$.conditions[2].conditions[1]".to_string(),
                    IssueKind::UnknownStatus("retired".to_string())
                ),
                (
                    "$.conditions[2].conditions[2]".to_string(),
                    IssueKind::EmptyGroup
                ),
            ]
        );
    }

    #[test]
    fn test_empty_key_and_missing_value_together() {
        let tree = Group::and(vec![Condition::new(
            ConditionType::FlagNotHasValue,
            "",
            None,
        )
        .into()]);
        assert_eq!(
            kinds(&tree),
            vec![
                ("$.conditions[0]".to_string(), IssueKind::EmptyKey),
                ("$.conditions[0]".to_string(), IssueKind::MissingValue),
            ]
        );
    }

    #[test]
    fn test_custom_status_values() {
        let options = ValidationOptions::with_status_values("enrolled, withdrawn");
        assert_eq!(options.status_values, vec!["enrolled", "withdrawn"]);

        let tree = Group::and(vec![Condition::has_status("enrolled").into()]);
        assert!(validate(&tree, &options).is_empty());

        let tree = Group::and(vec![Condition::has_status("active").into()]);
        assert_eq!(validate(&tree, &options).len(), 1);
    }

    #[test]
    fn test_default_status_values() {
        assert_eq!(
            ValidationOptions::default().status_values,
            vec!["active", "temporary"]
        );
    }

    #[test]
    fn test_blank_status_list_keeps_defaults() {
        assert_eq!(
            ValidationOptions::with_status_values(" , "),
            ValidationOptions::default()
        );
    }

    #[test]
    fn test_issue_display() {
        let issue = RuleIssue {
            path: "$.conditions[0]".to_string(),
            kind: IssueKind::UnknownType("bogus".to_string()),
        };
        assert_eq!(
            issue.to_string(),
            "$.conditions[0]: unknown condition type \"bogus\""
        );
    }
}
