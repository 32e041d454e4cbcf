//! Rules loader - YAML/JSON file loading and parsing
//!
//! Files ending in `.json` are read as JSON; everything else as YAML, which
//! also accepts JSON documents.

use super::error::Result;
use super::types::{ParticipantRecord, RecruitmentListRules};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Loads recruitment-list rules and participant files
pub struct RulesLoader;

impl RulesLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load recruitment-list rules from a file
    pub fn load_rules<P: AsRef<Path>>(&self, path: P) -> Result<RecruitmentListRules> {
        load_file(path.as_ref())
    }

    /// Load a list of participant records from a file
    pub fn load_participants<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ParticipantRecord>> {
        load_file(path.as_ref())
    }

    /// Parse rules from a YAML string
    pub fn parse_yaml(content: &str) -> Result<RecruitmentListRules> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse rules from a JSON string
    pub fn parse_json(content: &str) -> Result<RecruitmentListRules> {
        Ok(serde_json::from_str(content)?)
    }
}

impl Default for RulesLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    log::debug!("Loaded {} ({} bytes)", path.display(), content.len());

    if path.extension().is_some_and(|ext| ext == "json") {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::error::CriteriaError;
    use crate::criteria::types::{CriteriaDef, InclusionType};
    use std::io::Write;

    #[test]
    fn test_parse_auto_inclusion_yaml() {
        let yaml = r#"
name: Sleep study
participantInclusion:
  studyKey: sleep
  type: auto
  autoConfig:
    criteria: '{"operator":"AND","conditions":[{"type":"flagExists","key":"consented"}]}'
    startDate: "2024-01-01T00:00:00Z"
exclusionConditions:
  - key: withdrawn
    value: "true"
"#;
        let rules = RulesLoader::parse_yaml(yaml).unwrap();
        assert_eq!(rules.name.as_deref(), Some("Sleep study"));
        assert_eq!(rules.participant_inclusion.study_key, "sleep");
        assert_eq!(
            rules.participant_inclusion.inclusion_type,
            InclusionType::Auto
        );

        let auto = rules.participant_inclusion.auto_config.unwrap();
        assert!(matches!(auto.criteria, Some(CriteriaDef::Serialized(_))));
        assert_eq!(auto.start_date.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert!(auto.end_date.is_none());

        assert_eq!(rules.exclusion_conditions.len(), 1);
        assert_eq!(rules.exclusion_conditions[0].key, "withdrawn");
    }

    #[test]
    fn test_parse_inline_criteria_yaml() {
        let yaml = r#"
participantInclusion:
  studyKey: sleep
  type: auto
  autoConfig:
    criteria:
      operator: OR
      conditions:
        - type: hasStatus
          key: ""
          value: active
"#;
        let rules = RulesLoader::parse_yaml(yaml).unwrap();
        let auto = rules.participant_inclusion.auto_config.unwrap();
        assert!(matches!(auto.criteria, Some(CriteriaDef::Inline(_))));
    }

    #[test]
    fn test_parse_manual_json() {
        let json = r#"{
            "participantInclusion": {"studyKey": "s", "type": "manual"}
        }"#;
        let rules = RulesLoader::parse_json(json).unwrap();
        assert_eq!(
            rules.participant_inclusion.inclusion_type,
            InclusionType::Manual
        );
        assert!(rules.participant_inclusion.auto_config.is_none());
        assert!(rules.exclusion_conditions.is_empty());
        assert!(rules.participant_inclusion.notification_emails.is_empty());
    }

    #[test]
    fn test_invalid_yaml_returns_error() {
        let yaml = r#"
participantInclusion:
  - invalid structure
"#;
        let result = RulesLoader::parse_yaml(yaml);
        assert!(matches!(result, Err(CriteriaError::Yaml(_))));
    }

    #[test]
    fn test_load_rules_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"participantInclusion": {{"studyKey": "s", "type": "auto"}}}}"#
        )
        .unwrap();

        let rules = RulesLoader::new().load_rules(file.path()).unwrap();
        assert_eq!(rules.participant_inclusion.study_key, "s");
    }

    #[test]
    fn test_load_participants_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r#"
- participantId: p1
  flags:
    consented: "true"
  status: active
- participantId: p2
"#
        )
        .unwrap();

        let participants = RulesLoader::new().load_participants(file.path()).unwrap();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].status, "active");
        assert_eq!(participants[1].participant_id, "p2");
    }

    #[test]
    fn test_load_missing_file() {
        let result = RulesLoader::new().load_rules("/definitely/not/here.yaml");
        assert!(matches!(result, Err(CriteriaError::Io(_))));
    }
}
