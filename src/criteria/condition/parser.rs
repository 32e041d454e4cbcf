//! Rule tree parser
//!
//! Reads the persisted JSON form:
//! - `{"operator": "AND", "conditions": [...]}` for groups
//! - `{"type": "flagHasValue", "key": "consented", "value": "true"}` for leaves
//!
//! A node may also carry `"kind": "group" | "condition"`. Without it, an
//! `operator` field marks a group.

use super::ast::{Condition, ConditionType, Group, Node, Operator};
use crate::criteria::error::{CriteriaError, Result};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

const ROOT: &str = "$";

/// Parse a serialized rule tree
pub fn parse(input: &str) -> Result<Group> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| CriteriaError::malformed(ROOT, format!("invalid JSON: {}", e)))?;
    parse_value(&value)
}

/// Parse a rule tree that has already been decoded into a JSON value
pub fn parse_value(value: &Value) -> Result<Group> {
    let obj = as_object(value, ROOT)?;
    if node_kind(obj, ROOT)? == Some(NodeKind::Condition) {
        return Err(CriteriaError::malformed(ROOT, "root must be a group"));
    }
    parse_group(obj, ROOT)
}

/// Parse a rule tree written inline in a rules file. Scalar `key` and
/// `value` fields such as `value: true` are read in their string form, the
/// same way the rest of the rules file reads them.
pub fn parse_inline(value: &Value) -> Result<Group> {
    let mut value = value.clone();
    stringify_scalars(&mut value);
    parse_value(&value)
}

fn stringify_scalars(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            for (field, child) in obj.iter_mut() {
                match child {
                    Value::Bool(_) | Value::Number(_) if field == "key" || field == "value" => {
                        *child = Value::String(child.to_string());
                    }
                    _ => stringify_scalars(child),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(stringify_scalars),
        _ => {}
    }
}

/// Serialize a rule tree to its persisted JSON form
pub fn serialize(tree: &Group) -> String {
    tree.to_value().to_string()
}

/// Persisted criteria string for a tree. An empty root is stored as absent.
pub fn to_criteria_string(tree: &Group) -> Option<String> {
    if tree.is_empty() {
        None
    } else {
        Some(serialize(tree))
    }
}

/// Parse optional persisted criteria. Absent or blank input yields an empty
/// AND root, which matches every participant.
pub fn parse_criteria(criteria: Option<&str>) -> Result<Group> {
    match criteria.map(str::trim) {
        None | Some("") => Ok(Group::default()),
        Some(input) => parse(input),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Group,
    Condition,
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CriteriaError::malformed(path, "expected an object"))
}

fn node_kind(obj: &Map<String, Value>, path: &str) -> Result<Option<NodeKind>> {
    match obj.get("kind") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(kind)) => match kind.as_str() {
            "group" => Ok(Some(NodeKind::Group)),
            "condition" => {
                if obj.contains_key("operator") {
                    return Err(CriteriaError::malformed(
                        path,
                        "`kind` is \"condition\" but the node has an `operator`",
                    ));
                }
                Ok(Some(NodeKind::Condition))
            }
            other => Err(CriteriaError::malformed(
                path,
                format!("unknown `kind` \"{}\", expected group or condition", other),
            )),
        },
        Some(_) => Err(CriteriaError::malformed(path, "`kind` must be a string")),
    }
}

fn parse_node(value: &Value, path: &str) -> Result<Node> {
    let obj = as_object(value, path)?;
    let kind = match node_kind(obj, path)? {
        Some(kind) => kind,
        None if obj.contains_key("operator") => NodeKind::Group,
        None => NodeKind::Condition,
    };

    match kind {
        NodeKind::Group => parse_group(obj, path).map(Node::Group),
        NodeKind::Condition => parse_condition(obj, path).map(Node::Condition),
    }
}

fn parse_group(obj: &Map<String, Value>, path: &str) -> Result<Group> {
    let operator = match obj.get("operator") {
        None => return Err(CriteriaError::malformed(path, "missing `operator`")),
        Some(Value::String(name)) => Operator::parse(name).ok_or_else(|| {
            CriteriaError::malformed(
                path,
                format!("unknown operator \"{}\", expected AND or OR", name),
            )
        })?,
        Some(_) => return Err(CriteriaError::malformed(path, "`operator` must be a string")),
    };

    let children = match obj.get("conditions") {
        None => return Err(CriteriaError::malformed(path, "missing `conditions`")),
        Some(Value::Array(children)) => children,
        Some(_) => {
            return Err(CriteriaError::malformed(
                path,
                "`conditions` must be an array",
            ))
        }
    };

    let conditions = children
        .iter()
        .enumerate()
        .map(|(i, child)| parse_node(child, &format!("{}.conditions[{}]", path, i)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Group {
        operator,
        conditions,
    })
}

fn parse_condition(obj: &Map<String, Value>, path: &str) -> Result<Condition> {
    let condition_type = match obj.get("type") {
        None | Some(Value::Null) => return Err(CriteriaError::malformed(path, "missing `type`")),
        Some(Value::String(name)) => ConditionType::from_name(name),
        Some(_) => return Err(CriteriaError::malformed(path, "`type` must be a string")),
    };

    let key = optional_string(obj, "key", path)?.unwrap_or_default();
    let value = optional_string(obj, "value", path)?;

    Ok(Condition {
        condition_type,
        key,
        value,
    })
}

fn optional_string(obj: &Map<String, Value>, field: &str, path: &str) -> Result<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CriteriaError::malformed(
            path,
            format!("`{}` must be a string", field),
        )),
    }
}

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse_inline(&value).map_err(serde::de::Error::custom)
    }
}
