use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::types::StatuteNode;

/// Supplies the section tree of a statute by identifier.
#[async_trait]
pub trait StatuteSource: Send + Sync {
    async fn structure(&self, statute_id: &str) -> Result<StatuteNode>;
}

/// Statute structures previously extracted to `<dir>/<id>.json`.
pub struct DiskStatuteSource {
    dir: PathBuf,
    /// Parsed structures stay in memory after the first read.
    cache: RwLock<HashMap<String, StatuteNode>>,
}

impl DiskStatuteSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn path_for(&self, statute_id: &str) -> PathBuf {
        let file: String = statute_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

#[async_trait]
impl StatuteSource for DiskStatuteSource {
    async fn structure(&self, statute_id: &str) -> Result<StatuteNode> {
        {
            let cache = self.cache.read().await;
            if let Some(node) = cache.get(statute_id) {
                return Ok(node.clone());
            }
        }

        let path = self.path_for(statute_id);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("no cached structure for statute {statute_id} at {}", path.display()))?;
        let node: StatuteNode = serde_json::from_str(&raw)
            .with_context(|| format!("invalid statute structure in {}", path.display()))?;
        debug!(statute_id, size = node.serialized_len(), "statute structure loaded");

        {
            let mut cache = self.cache.write().await;
            cache.insert(statute_id.to_string(), node.clone());
        }

        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_and_caches_structure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("10011336.json"),
            r#"{"§ 20 - Fahrgeschwindigkeit": ["Auf Autobahnen 130 km/h."]}"#,
        )
        .unwrap();

        let source = DiskStatuteSource::new(dir.path());
        let node = source.structure("10011336").await.unwrap();
        assert_eq!(node.headings(), vec!["§ 20 - Fahrgeschwindigkeit"]);

        // served from memory once the file is gone
        std::fs::remove_file(dir.path().join("10011336.json")).unwrap();
        assert_eq!(source.structure("10011336").await.unwrap(), node);
    }

    #[tokio::test]
    async fn missing_structure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DiskStatuteSource::new(dir.path());
        let err = source.structure("42").await.unwrap_err();
        assert!(err.to_string().contains("no cached structure"));
    }

    #[test]
    fn identifiers_cannot_escape_the_directory() {
        let source = DiskStatuteSource::new("/data/statutes");
        assert_eq!(
            source.path_for("../../etc/passwd"),
            PathBuf::from("/data/statutes/etcpasswd.json")
        );
    }
}
