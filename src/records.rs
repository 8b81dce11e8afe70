//! Run records on disk, one pretty-printed JSON file per question.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::agent::types::RunRecord;

const MAX_SLUG_LEN: usize = 80;

/// File-name-safe form of a question.
pub fn slug(question: &str) -> String {
    let mut out = String::with_capacity(question.len());
    let mut gap = false;
    for c in question.trim().to_lowercase().chars() {
        let mapped = match c {
            'ä' => Some("ae"),
            'ö' => Some("oe"),
            'ü' => Some("ue"),
            'ß' => Some("ss"),
            _ => None,
        };
        if let Some(m) = mapped {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            out.push_str(m);
        } else if c.is_ascii_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            out.push(c);
        } else {
            gap = true;
        }
    }

    if out.is_empty() {
        return "frage".to_string();
    }
    if out.len() > MAX_SLUG_LEN {
        let hash = blake3::hash(question.as_bytes()).to_hex();
        let keep = MAX_SLUG_LEN - 9;
        out.truncate(keep);
        let trimmed = out.trim_end_matches('_').len();
        out.truncate(trimmed);
        out.push('_');
        out.push_str(&hash.as_str()[..8]);
    }
    out
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, question: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slug(question)))
    }

    /// Write `record` to `<dir>/<slug>.json`, replacing an earlier run of the
    /// same question.
    pub async fn save(&self, record: &RunRecord) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create records directory {}", self.dir.display()))?;
        let path = self.path_for(&record.question);
        let json = serde_json::to_string_pretty(record).context("Failed to serialize run record")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write run record {}", path.display()))?;
        info!(path = %path.display(), depth = record.depth, "run record saved");
        Ok(path)
    }

    pub async fn load(path: &Path) -> Result<RunRecord> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read run record {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Run record {} is not valid", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::{ProgressSummary, RunOutcome, TrailEntry};
    use crate::index::types::StatuteRef;
    use crate::llm::Message;
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[test]
    fn slug_transliterates_and_collapses() {
        assert_eq!(
            slug("Darf ich auf dem Gehsteig parken?"),
            "darf_ich_auf_dem_gehsteig_parken"
        );
        assert_eq!(slug("Größe der Übertretung"), "groesse_der_uebertretung");
        assert_eq!(slug("  §§ 1-3 !!"), "1_3");
        assert_eq!(slug("???"), "frage");
    }

    #[test]
    fn long_slugs_are_truncated_with_hash() {
        let a = format!("{} Variante A", "sehr lange Frage ".repeat(10));
        let b = format!("{} Variante B", "sehr lange Frage ".repeat(10));
        let (sa, sb) = (slug(&a), slug(&b));
        assert!(sa.len() <= MAX_SLUG_LEN);
        assert_ne!(sa, sb);
        assert!(sa.starts_with("sehr_lange_frage_sehr"));
    }

    #[tokio::test]
    async fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("records"));
        let now = Utc::now();
        let record = RunRecord {
            question: "Darf ich parken?".into(),
            depth: 0,
            started_at: now,
            finished_at: now,
            iterations: 2,
            outcome: RunOutcome::NoAnswerFound,
            search_trail: vec![TrailEntry::new(
                &StatuteRef {
                    id: "10011336".into(),
                    title: "StVO 1960".into(),
                },
                None,
            )],
            progress_summary: ProgressSummary::default(),
            last_analysis: None,
            final_report: None,
            resolved_terms: BTreeMap::new(),
            full_history: vec![Message::system("system"), Message::user("Frage")],
        };

        let path = store.save(&record).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "darf_ich_parken.json");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"kind\": \"no_answer_found\""));

        let loaded = RecordStore::load(&path).await.unwrap();
        assert_eq!(loaded, record);
        assert!(!loaded.is_answered());
    }
}
