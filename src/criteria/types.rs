// SPDX-License-Identifier: MIT

//! Schema types for recruitment-list rule files
//!
//! These mirror the participant inclusion and exclusion settings of a
//! recruitment list. Files use camelCase field names, in YAML or JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level rules of one recruitment list
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecruitmentListRules {
    #[serde(default)]
    pub name: Option<String>,
    pub participant_inclusion: ParticipantInclusion,
    /// Participants matching any of these are excluded
    #[serde(default)]
    pub exclusion_conditions: Vec<ExclusionCondition>,
}

/// How participants enter the list
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInclusion {
    pub study_key: String,
    #[serde(rename = "type")]
    pub inclusion_type: InclusionType,
    /// Only used when `type` is `auto`. Absent means "include everyone".
    pub auto_config: Option<AutoConfig>,
    #[serde(default)]
    pub notification_emails: Vec<String>,
}

/// Inclusion mode
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InclusionType {
    /// Participants are added by hand; the inclusion job leaves them alone
    Manual,
    /// The inclusion job adds participants matching the criteria
    Auto,
}

/// Automatic inclusion settings
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AutoConfig {
    pub criteria: Option<CriteriaDef>,
    /// RFC 3339 timestamp; participants who entered earlier are skipped
    pub start_date: Option<String>,
    /// RFC 3339 timestamp; participants who entered later are skipped
    pub end_date: Option<String>,
}

/// Criteria as stored by the portal (a JSON string) or written inline
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum CriteriaDef {
    Serialized(String),
    Inline(serde_json::Value),
}

/// Exclude participants whose flag `key` equals `value`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ExclusionCondition {
    pub key: String,
    pub value: String,
}

/// A participant as read from a participants file
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub participant_id: String,
    /// Participant infos/flags
    #[serde(default, alias = "infos")]
    pub flags: HashMap<String, String>,
    #[serde(default, alias = "recruitmentStatus")]
    pub status: String,
    /// When the participant entered the study
    #[serde(default)]
    pub entered_at: Option<DateTime<Utc>>,
}
