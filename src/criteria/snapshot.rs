// SPDX-License-Identifier: MIT

//! Read-only participant data consumed by the evaluator

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One participant's flags and status at evaluation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Snapshot {
    /// Key presence means the flag exists
    #[serde(default)]
    pub flags: HashMap<String, String>,
    #[serde(default)]
    pub status: String,
}

impl Snapshot {
    /// Create a snapshot with the given status and no flags
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            flags: HashMap::new(),
            status: status.into(),
        }
    }

    /// Create an empty snapshot
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style flag setter
    pub fn with_flag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.flags.insert(key.into(), value.into());
        self
    }

    pub fn with_flags(mut self, flags: HashMap<String, String>) -> Self {
        self.flags.extend(flags);
        self
    }

    /// Get a flag value
    pub fn flag(&self, key: &str) -> Option<&str> {
        self.flags.get(key).map(String::as_str)
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.flag("anything").is_none());
        assert_eq!(snapshot.status(), "");
    }

    #[test]
    fn test_with_flag() {
        let snapshot = Snapshot::new("active")
            .with_flag("consented", "true")
            .with_flag("site", "a");

        assert_eq!(snapshot.status(), "active");
        assert_eq!(snapshot.flag("consented"), Some("true"));
        assert!(snapshot.has_flag("site"));
        assert!(!snapshot.has_flag("blocked"));
    }

    #[test]
    fn test_with_flags_overwrites() {
        let mut extra = HashMap::new();
        extra.insert("site".to_string(), "b".to_string());

        let snapshot = Snapshot::new("active")
            .with_flag("site", "a")
            .with_flags(extra);
        assert_eq!(snapshot.flag("site"), Some("b"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"status":"active"}"#).unwrap();
        assert!(snapshot.flags.is_empty());
        assert_eq!(snapshot.status, "active");

        let snapshot: Snapshot = serde_json::from_str(r#"{"flags":{"a":"1"}}"#).unwrap();
        assert_eq!(snapshot.flag("a"), Some("1"));
        assert_eq!(snapshot.status, "");
    }
}
