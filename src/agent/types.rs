use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::index::types::StatuteRef;
use crate::llm::Message;

use super::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answered {
    Yes,
    NotYet,
}

/// Compressed state of the search, replaced at every checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub summary: String,
    pub answered: Answered,
    pub justification: String,
}

impl Default for ProgressSummary {
    fn default() -> Self {
        Self {
            summary: String::new(),
            answered: Answered::NotYet,
            justification: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    ContinueSearch,
    Done,
}

/// The model's judgement of one statute or fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub sufficient: bool,
    pub rationale: String,
    pub proposed_approach: String,
    pub next_step: Decision,
    /// Heading of the analysed fragment; `None` for whole-statute analysis.
    #[serde(default)]
    pub section: Option<String>,
}

/// One inspected statute (and section) in the search trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailEntry {
    pub statute_id: String,
    pub title: String,
    #[serde(default)]
    pub section: Option<String>,
}

impl TrailEntry {
    pub fn new(statute: &StatuteRef, section: Option<String>) -> Self {
        Self {
            statute_id: statute.id.clone(),
            title: statute.title.clone(),
            section,
        }
    }

    pub fn display(&self) -> String {
        match &self.section {
            Some(section) => format!("{} - {} - {}", self.statute_id, self.title, section),
            None => format!("{} - {}", self.statute_id, self.title),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    /// How the answer was found.
    pub summary: String,
    /// Answer for legal experts.
    pub detailed_answer: String,
    /// Answer for lay readers.
    pub plain_answer: String,
    /// One explicit sentence.
    pub short_answer: String,
    pub justification: String,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    Answered,
    NoAnswerFound,
    Interrupted,
    SchemaExhausted { step: String },
    Aborted { reason: String },
}

impl From<&AgentError> for RunOutcome {
    fn from(err: &AgentError) -> Self {
        match err {
            AgentError::SchemaExhausted { step, .. } => RunOutcome::SchemaExhausted {
                step: step.to_string(),
            },
            other => RunOutcome::Aborted {
                reason: other.to_string(),
            },
        }
    }
}

/// Explanation of a jargon term, produced by a nested run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTerm {
    pub question: String,
    pub outcome: RunOutcome,
    pub report: Option<FinalReport>,
}

/// Everything persisted about one run, answered or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub question: String,
    pub depth: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub iterations: u32,
    pub outcome: RunOutcome,
    pub search_trail: Vec<TrailEntry>,
    pub progress_summary: ProgressSummary,
    pub last_analysis: Option<Analysis>,
    pub final_report: Option<FinalReport>,
    pub resolved_terms: BTreeMap<String, ResolvedTerm>,
    pub full_history: Vec<Message>,
}

impl RunRecord {
    pub fn is_answered(&self) -> bool {
        self.final_report.is_some()
    }
}
