pub mod source;
pub mod types;

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use types::{CategoryNode, StatuteSummary};

/// Two or three category labels forming a valid key chain into the index,
/// ending at a statute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn display(&self) -> String {
        self.0.join(" > ")
    }
}

/// Read-only category → statute index shared by every run.
#[derive(Debug, Clone)]
pub struct CategoryIndex {
    root: CategoryNode,
}

impl CategoryIndex {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read category index {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).context("Category index is not valid JSON")?;
        let index = Self::from_value(value)?;
        debug!(path = %path.display(), top_level = index.top_labels().len(), "category index loaded");
        Ok(index)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let root = CategoryNode::try_from(value).map_err(|e| anyhow::anyhow!(e))?;
        if !matches!(root, CategoryNode::Branch(_)) {
            bail!("category index root must be an object of categories");
        }
        if root.has_empty_branch() {
            bail!("category index contains a category without subcategories or statutes");
        }
        let (min, max) = (root.min_depth(), root.depth());
        if min < 2 || max > 3 {
            bail!("category index must be 2 or 3 levels deep (found {min}..={max})");
        }
        Ok(Self { root })
    }

    pub fn top_labels(&self) -> Vec<&str> {
        self.root.labels().unwrap_or_default()
    }

    pub fn node(&self, labels: &[String]) -> Option<&CategoryNode> {
        labels
            .iter()
            .try_fold(&self.root, |node, label| node.child(label))
    }

    /// Category labels one level below `labels`; `None` when that node is a
    /// statute list or does not exist.
    pub fn labels(&self, labels: &[String]) -> Option<Vec<&str>> {
        self.node(labels).and_then(CategoryNode::labels)
    }

    /// Build a validated path. Fails if the chain is not 2-3 labels long or
    /// does not end at a statute list.
    pub fn path(&self, labels: Vec<String>) -> Result<CategoryPath> {
        if !(2..=3).contains(&labels.len()) {
            bail!("category path must have 2 or 3 labels, got {}", labels.len());
        }
        match self.node(&labels) {
            Some(CategoryNode::Statutes(_)) => Ok(CategoryPath(labels)),
            Some(CategoryNode::Branch(_)) => {
                bail!("category path {:?} stops above the statute level", labels)
            }
            None => bail!("category path {:?} is not in the index", labels),
        }
    }

    /// Statutes filed under `path`, skipping entries without an identifier.
    pub fn statutes(&self, path: &CategoryPath) -> Vec<&StatuteSummary> {
        match self.node(path.labels()) {
            Some(CategoryNode::Statutes(items)) => items
                .iter()
                .filter(|s| !s.id.trim().is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> CategoryIndex {
        CategoryIndex::from_value(json!({
            "9 Verkehr": {
                "90 Strassenverkehr": [
                    {"id": "10011336", "short_title": "Strassenverkehrsordnung 1960"},
                    {"id": "", "short_title": "ohne Nummer"}
                ],
                "91 Eisenbahn": {
                    "910 Allgemein": [{"id": "10011302", "short_title": "Eisenbahngesetz 1957"}]
                }
            },
            "1 Verfassung": {
                "10 Bundesverfassung": [{"id": "10000138", "short_title": "B-VG"}]
            }
        }))
        .unwrap()
    }

    #[test]
    fn keeps_source_order() {
        assert_eq!(index().top_labels(), vec!["9 Verkehr", "1 Verfassung"]);
    }

    #[test]
    fn labels_stop_at_statute_lists() {
        let idx = index();
        let verkehr = vec!["9 Verkehr".to_string()];
        assert_eq!(
            idx.labels(&verkehr).unwrap(),
            vec!["90 Strassenverkehr", "91 Eisenbahn"]
        );
        let strasse = vec!["9 Verkehr".to_string(), "90 Strassenverkehr".to_string()];
        assert!(idx.labels(&strasse).is_none());
        let bahn = vec!["9 Verkehr".to_string(), "91 Eisenbahn".to_string()];
        assert_eq!(idx.labels(&bahn).unwrap(), vec!["910 Allgemein"]);
    }

    #[test]
    fn path_must_end_at_statutes() {
        let idx = index();
        let two = idx
            .path(vec!["9 Verkehr".into(), "90 Strassenverkehr".into()])
            .unwrap();
        assert_eq!(two.labels().len(), 2);
        let three = idx
            .path(vec!["9 Verkehr".into(), "91 Eisenbahn".into(), "910 Allgemein".into()])
            .unwrap();
        assert_eq!(three.labels().len(), 3);
        assert!(idx.path(vec!["9 Verkehr".into(), "91 Eisenbahn".into()]).is_err());
        assert!(idx.path(vec!["9 Verkehr".into(), "99 Luftfahrt".into()]).is_err());
        assert!(idx.path(vec!["9 Verkehr".into()]).is_err());
    }

    #[test]
    fn statutes_skip_empty_ids() {
        let idx = index();
        let path = idx
            .path(vec!["9 Verkehr".into(), "90 Strassenverkehr".into()])
            .unwrap();
        let statutes = idx.statutes(&path);
        assert_eq!(statutes.len(), 1);
        assert_eq!(statutes[0].id, "10011336");
    }

    #[test]
    fn rejects_wrong_depth() {
        assert!(CategoryIndex::from_value(json!({"1 A": [{"id": "1", "short_title": "x"}]})).is_err());
        assert!(CategoryIndex::from_value(json!({
            "1": {"2": {"3": {"4": [{"id": "1", "short_title": "x"}]}}}
        }))
        .is_err());
        assert!(CategoryIndex::from_value(json!([])).is_err());
    }

    #[test]
    fn rejects_empty_categories() {
        let err = CategoryIndex::from_value(json!({
            "9 Verkehr": {
                "90 Strassenverkehr": [{"id": "10011336", "short_title": "StVO 1960"}],
                "91 Eisenbahn": {}
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("without subcategories"));
        assert!(CategoryIndex::from_value(json!({})).is_err());
    }
}
