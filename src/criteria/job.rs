// SPDX-License-Identifier: MIT

//! Inclusion and exclusion jobs
//!
//! Rules are compiled once per batch: criteria are parsed and dates are
//! checked up front, so a bad configuration is reported before any
//! participant is looked at. Judging a participant afterwards cannot fail.

use crate::criteria::condition::{self, Group, IssueKind, RuleIssue, ValidationOptions};
use crate::criteria::error::{CriteriaError, Result};
use crate::criteria::snapshot::Snapshot;
use crate::criteria::types::{
    CriteriaDef, ExclusionCondition, InclusionType, ParticipantRecord, RecruitmentListRules,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Default number of participants judged per blocking task
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Rules ready for evaluation
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub inclusion_type: InclusionType,
    /// Parsed criteria; an empty root includes everyone
    pub criteria: Arc<Group>,
    pub window: DateWindow,
    pub exclusions: Vec<ExclusionCondition>,
    /// Advisory problems found while compiling; callers decide how to report them
    pub issues: Vec<RuleIssue>,
}

/// Inclusive date range on `enteredAt`. Missing bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Outcome of the inclusion job for one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionVerdict {
    Included,
    /// Criteria not satisfied
    NotMatched,
    /// Entered the study outside the configured date range
    OutsideWindow,
    /// List uses manual inclusion
    Manual,
}

/// Combined verdict for one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantVerdict {
    pub participant_id: String,
    pub inclusion: InclusionVerdict,
    /// The first exclusion condition that matched
    pub excluded_by: Option<ExclusionCondition>,
}

/// Counts over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub included: usize,
    pub not_matched: usize,
    pub outside_window: usize,
    pub manual: usize,
    pub excluded: usize,
}

impl DateWindow {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A participant with no entry date is only inside an unbounded window
    pub fn contains(&self, entered_at: Option<DateTime<Utc>>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(at) = entered_at else {
            return false;
        };
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at <= end)
    }
}

impl CompiledRules {
    /// Parse and check the rules of a recruitment list
    pub fn compile(rules: &RecruitmentListRules, options: &ValidationOptions) -> Result<Self> {
        let inclusion = &rules.participant_inclusion;
        let (criteria, window) = match (&inclusion.inclusion_type, &inclusion.auto_config) {
            (InclusionType::Auto, Some(auto)) => {
                let criteria = match &auto.criteria {
                    None => Group::default(),
                    Some(CriteriaDef::Serialized(raw)) => {
                        condition::parse_criteria(Some(raw.as_str()))?
                    }
                    Some(CriteriaDef::Inline(value)) => condition::parse_inline(value)?,
                };
                let window = DateWindow {
                    start: parse_date("startDate", auto.start_date.as_deref())?,
                    end: parse_date("endDate", auto.end_date.as_deref())?,
                };
                (criteria, window)
            }
            _ => (Group::default(), DateWindow::default()),
        };

        if let (Some(start), Some(end)) = (window.start, window.end) {
            if start > end {
                return Err(CriteriaError::config(format!(
                    "startDate {} is after endDate {}",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )));
            }
        }

        let mut issues = condition::validate(&criteria, options);
        for (i, exclusion) in rules.exclusion_conditions.iter().enumerate() {
            if exclusion.key.is_empty() {
                issues.push(RuleIssue {
                    path: format!("exclusionConditions[{}]", i),
                    kind: IssueKind::EmptyExclusionKey,
                });
            }
        }

        Ok(Self {
            inclusion_type: inclusion.inclusion_type,
            criteria: Arc::new(criteria),
            window,
            exclusions: rules.exclusion_conditions.clone(),
            issues,
        })
    }

    /// Decide whether the inclusion job should include a participant
    pub fn inclusion(
        &self,
        snapshot: &Snapshot,
        entered_at: Option<DateTime<Utc>>,
    ) -> InclusionVerdict {
        if self.inclusion_type == InclusionType::Manual {
            return InclusionVerdict::Manual;
        }
        if !self.window.contains(entered_at) {
            return InclusionVerdict::OutsideWindow;
        }
        if condition::evaluate(&self.criteria, snapshot) {
            InclusionVerdict::Included
        } else {
            InclusionVerdict::NotMatched
        }
    }

    /// The first exclusion condition whose flag matches exactly
    pub fn matching_exclusion(&self, snapshot: &Snapshot) -> Option<&ExclusionCondition> {
        self.exclusions.iter().find(|exclusion| {
            !exclusion.key.is_empty()
                && snapshot.flag(&exclusion.key) == Some(exclusion.value.as_str())
        })
    }

    /// Judge one participant record
    pub fn judge(&self, record: &ParticipantRecord) -> ParticipantVerdict {
        let snapshot = Snapshot::new(record.status.clone()).with_flags(record.flags.clone());
        let inclusion = self.inclusion(&snapshot, record.entered_at);
        let excluded_by = self.matching_exclusion(&snapshot).cloned();

        log::debug!(
            "Participant {}: {} (excluded: {})",
            record.participant_id,
            inclusion,
            excluded_by.is_some()
        );

        ParticipantVerdict {
            participant_id: record.participant_id.clone(),
            inclusion,
            excluded_by,
        }
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|date| Some(date.with_timezone(&Utc)))
            .map_err(|e| CriteriaError::config(format!("invalid {} '{}': {}", field, raw, e))),
    }
}

/// Judge a batch of participants in parallel. Verdicts keep input order.
pub async fn run_batch(
    rules: Arc<CompiledRules>,
    records: Vec<ParticipantRecord>,
    chunk_size: usize,
) -> Result<Vec<ParticipantVerdict>> {
    let chunk_size = chunk_size.max(1);
    let total = records.len();

    let mut chunks: Vec<Vec<ParticipantRecord>> = Vec::new();
    let mut records = records.into_iter().peekable();
    while records.peek().is_some() {
        chunks.push(records.by_ref().take(chunk_size).collect());
    }

    let mut tasks = JoinSet::new();
    for (index, chunk) in chunks.into_iter().enumerate() {
        let rules = Arc::clone(&rules);
        tasks.spawn_blocking(move || {
            let verdicts: Vec<ParticipantVerdict> =
                chunk.iter().map(|record| rules.judge(record)).collect();
            (index, verdicts)
        });
    }

    let mut slots: Vec<Option<Vec<ParticipantVerdict>>> = vec![None; tasks.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, verdicts) = joined?;
        slots[index] = Some(verdicts);
    }

    let verdicts: Vec<ParticipantVerdict> = slots.into_iter().flatten().flatten().collect();
    let summary = BatchSummary::from_verdicts(&verdicts);
    log::info!("Judged {} participants: {}", total, summary);

    Ok(verdicts)
}

impl BatchSummary {
    pub fn from_verdicts(verdicts: &[ParticipantVerdict]) -> Self {
        let mut summary = Self::default();
        for verdict in verdicts {
            match verdict.inclusion {
                InclusionVerdict::Included => summary.included += 1,
                InclusionVerdict::NotMatched => summary.not_matched += 1,
                InclusionVerdict::OutsideWindow => summary.outside_window += 1,
                InclusionVerdict::Manual => summary.manual += 1,
            }
            if verdict.excluded_by.is_some() {
                summary.excluded += 1;
            }
        }
        summary
    }
}

impl fmt::Display for InclusionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InclusionVerdict::Included => write!(f, "included"),
            InclusionVerdict::NotMatched => write!(f, "not-matched"),
            InclusionVerdict::OutsideWindow => write!(f, "outside-window"),
            InclusionVerdict::Manual => write!(f, "manual"),
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} included, {} not matched, {} outside window, {} manual, {} excluded",
            self.included, self.not_matched, self.outside_window, self.manual, self.excluded
        )
    }
}
