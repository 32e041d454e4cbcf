// SPDX-License-Identifier: MIT

//! Condition tree types
//!
//! A rule tree is always rooted at a [`Group`]. Groups combine their children
//! with a single [`Operator`]; leaves are [`Condition`]s testing one flag or
//! the participant status.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// A node in a condition tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Atomic test against a flag or the status
    Condition(Condition),
    /// Nested AND/OR combination
    Group(Group),
}

/// AND/OR combination of child nodes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    pub operator: Operator,
    /// Evaluation ignores order; it is kept for display
    pub conditions: Vec<Node>,
}

/// Leaf condition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Condition {
    pub condition_type: ConditionType,
    /// Flag name; unused by `hasStatus`
    pub key: String,
    pub value: Option<String>,
}

/// Logical operator of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    And,
    Or,
}

/// Leaf condition types
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConditionType {
    /// flags contain the key
    #[default]
    FlagExists,
    /// flags lack the key
    FlagNotExists,
    /// flags[key] equals value
    FlagHasValue,
    /// flags lack the key, or flags[key] differs from value
    FlagNotHasValue,
    /// status equals value
    HasStatus,
    /// Any other type name, kept verbatim so it survives a round trip
    Unknown(UnknownTypeName),
}

/// A condition type name outside the known set. Only
/// [`ConditionType::from_name`] builds one, so it never spells a known type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeName(String);

impl UnknownTypeName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Operator {
    /// Parse an operator name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("and") {
            Some(Operator::And)
        } else if name.eq_ignore_ascii_case("or") {
            Some(Operator::Or)
        } else {
            None
        }
    }

    /// Canonical persisted name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }
}

impl ConditionType {
    /// Map a persisted type name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Self {
        match name {
            "flagExists" => ConditionType::FlagExists,
            "flagNotExists" => ConditionType::FlagNotExists,
            "flagHasValue" => ConditionType::FlagHasValue,
            "flagNotHasValue" => ConditionType::FlagNotHasValue,
            "hasStatus" => ConditionType::HasStatus,
            other => ConditionType::Unknown(UnknownTypeName(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConditionType::FlagExists => "flagExists",
            ConditionType::FlagNotExists => "flagNotExists",
            ConditionType::FlagHasValue => "flagHasValue",
            ConditionType::FlagNotHasValue => "flagNotHasValue",
            ConditionType::HasStatus => "hasStatus",
            ConditionType::Unknown(name) => name.as_str(),
        }
    }

    /// Conditions that look up `key` in the flag map
    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            ConditionType::FlagExists
                | ConditionType::FlagNotExists
                | ConditionType::FlagHasValue
                | ConditionType::FlagNotHasValue
        )
    }

    /// Conditions that compare against `value`
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            ConditionType::FlagHasValue | ConditionType::FlagNotHasValue | ConditionType::HasStatus
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ConditionType::Unknown(_))
    }
}

impl Condition {
    pub fn new(
        condition_type: ConditionType,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            condition_type,
            key: key.into(),
            value,
        }
    }

    pub fn flag_exists(key: impl Into<String>) -> Self {
        Self::new(ConditionType::FlagExists, key, None)
    }

    pub fn flag_not_exists(key: impl Into<String>) -> Self {
        Self::new(ConditionType::FlagNotExists, key, None)
    }

    pub fn flag_has_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ConditionType::FlagHasValue, key, Some(value.into()))
    }

    pub fn flag_not_has_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ConditionType::FlagNotHasValue, key, Some(value.into()))
    }

    pub fn has_status(status: impl Into<String>) -> Self {
        Self::new(ConditionType::HasStatus, "", Some(status.into()))
    }

    /// Persisted JSON form
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "type".to_string(),
            Value::String(self.condition_type.as_str().to_string()),
        );
        obj.insert("key".to_string(), Value::String(self.key.clone()));
        if let Some(value) = &self.value {
            obj.insert("value".to_string(), Value::String(value.clone()));
        }
        Value::Object(obj)
    }
}

impl Group {
    pub fn new(operator: Operator) -> Self {
        Self {
            operator,
            conditions: Vec::new(),
        }
    }

    pub fn and(conditions: Vec<Node>) -> Self {
        Self {
            operator: Operator::And,
            conditions,
        }
    }

    pub fn or(conditions: Vec<Node>) -> Self {
        Self {
            operator: Operator::Or,
            conditions,
        }
    }

    /// True when the group has no children. At the root this means
    /// "no criteria": every participant is included.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Persisted JSON form
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "operator".to_string(),
            Value::String(self.operator.as_str().to_string()),
        );
        obj.insert(
            "conditions".to_string(),
            Value::Array(self.conditions.iter().map(Node::to_value).collect()),
        );
        Value::Object(obj)
    }
}

impl Node {
    pub fn to_value(&self) -> Value {
        match self {
            Node::Condition(condition) => condition.to_value(),
            Node::Group(group) => group.to_value(),
        }
    }
}

impl From<Condition> for Node {
    fn from(condition: Condition) -> Self {
        Node::Condition(condition)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for UnknownTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn fmt_value(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => "<missing>".to_string(),
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition_type {
            ConditionType::FlagExists => write!(f, "flagExists({})", self.key),
            ConditionType::FlagNotExists => write!(f, "NOT flagExists({})", self.key),
            ConditionType::FlagHasValue => {
                write!(f, "flags[{}] == {}", self.key, fmt_value(&self.value))
            }
            ConditionType::FlagNotHasValue => {
                write!(f, "flags[{}] != {}", self.key, fmt_value(&self.value))
            }
            ConditionType::HasStatus => write!(f, "status == {}", fmt_value(&self.value)),
            ConditionType::Unknown(name) => write!(f, "unknown:{}({})", name, self.key),
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "TRUE");
        }
        write!(f, "(")?;
        for (i, node) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.operator)?;
            }
            write!(f, "{}", node)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Condition(condition) => fmt::Display::fmt(condition, f),
            Node::Group(group) => fmt::Display::fmt(group, f),
        }
    }
}
