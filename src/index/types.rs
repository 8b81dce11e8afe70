use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Statute entry listed under a leaf category of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatuteSummary {
    #[serde(alias = "gesetzesnummer")]
    pub id: String,
    #[serde(alias = "kurztitel")]
    pub short_title: String,
}

/// A statute the agent decided to inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatuteRef {
    pub id: String,
    pub title: String,
}

impl StatuteRef {
    /// "<id> - <title>", the form statutes are shown to the model in.
    pub fn display(&self) -> String {
        format!("{} - {}", self.id, self.title)
    }
}

impl From<&StatuteSummary> for StatuteRef {
    fn from(s: &StatuteSummary) -> Self {
        Self {
            id: s.id.clone(),
            title: s.short_title.clone(),
        }
    }
}

/// One level of the category index: either more categories or the statutes
/// filed under a leaf category. Key order of the source JSON is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum CategoryNode {
    Branch(Vec<(String, CategoryNode)>),
    Statutes(Vec<StatuteSummary>),
}

impl CategoryNode {
    pub fn child(&self, label: &str) -> Option<&CategoryNode> {
        match self {
            CategoryNode::Branch(children) => children
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, node)| node),
            CategoryNode::Statutes(_) => None,
        }
    }

    pub fn labels(&self) -> Option<Vec<&str>> {
        match self {
            CategoryNode::Branch(children) => Some(children.iter().map(|(l, _)| l.as_str()).collect()),
            CategoryNode::Statutes(_) => None,
        }
    }

    /// Number of category levels below and including this node.
    pub fn depth(&self) -> usize {
        match self {
            CategoryNode::Statutes(_) => 0,
            CategoryNode::Branch(children) => {
                1 + children.iter().map(|(_, n)| n.depth()).max().unwrap_or(0)
            }
        }
    }

    /// Whether some category below (or at) this node has no children at all.
    pub fn has_empty_branch(&self) -> bool {
        match self {
            CategoryNode::Statutes(_) => false,
            CategoryNode::Branch(children) => {
                children.is_empty() || children.iter().any(|(_, n)| n.has_empty_branch())
            }
        }
    }

    /// Shallowest leaf depth; used to reject indexes with ragged, too-short paths.
    pub fn min_depth(&self) -> usize {
        match self {
            CategoryNode::Statutes(_) => 0,
            CategoryNode::Branch(children) => {
                1 + children.iter().map(|(_, n)| n.min_depth()).min().unwrap_or(0)
            }
        }
    }
}

impl TryFrom<Value> for CategoryNode {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(label, v)| Ok((label, CategoryNode::try_from(v)?)))
                .collect::<Result<Vec<_>, String>>()
                .map(CategoryNode::Branch),
            Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    serde_json::from_value::<StatuteSummary>(item)
                        .map_err(|e| format!("invalid statute entry: {e}"))
                })
                .collect::<Result<Vec<_>, String>>()
                .map(CategoryNode::Statutes),
            other => Err(format!("expected category object or statute list, got {other}")),
        }
    }
}

impl From<CategoryNode> for Value {
    fn from(node: CategoryNode) -> Self {
        match node {
            CategoryNode::Branch(children) => Value::Object(
                children
                    .into_iter()
                    .map(|(label, n)| (label, Value::from(n)))
                    .collect(),
            ),
            CategoryNode::Statutes(items) => Value::Array(
                items
                    .into_iter()
                    .map(|s| serde_json::json!({ "id": s.id, "short_title": s.short_title }))
                    .collect(),
            ),
        }
    }
}

/// Internal structure of a statute: headings leading to paragraph lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum StatuteNode {
    Leaf(Vec<String>),
    Branch(Vec<(String, StatuteNode)>),
}

impl StatuteNode {
    pub fn headings(&self) -> Vec<&str> {
        match self {
            StatuteNode::Branch(children) => children.iter().map(|(h, _)| h.as_str()).collect(),
            StatuteNode::Leaf(_) => Vec::new(),
        }
    }

    pub fn child(&self, heading: &str) -> Option<&StatuteNode> {
        match self {
            StatuteNode::Branch(children) => children
                .iter()
                .find(|(h, _)| h == heading)
                .map(|(_, node)| node),
            StatuteNode::Leaf(_) => None,
        }
    }

    /// Characters of headings plus paragraph text; decides whether a statute
    /// is short enough to show whole.
    pub fn serialized_len(&self) -> usize {
        match self {
            StatuteNode::Leaf(paragraphs) => paragraphs.iter().map(|p| p.chars().count()).sum(),
            StatuteNode::Branch(children) => children
                .iter()
                .map(|(h, n)| h.chars().count() + n.serialized_len())
                .sum(),
        }
    }

    /// Plain text with headings on their own lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out.trim().to_string()
    }

    fn render_into(&self, out: &mut String) {
        match self {
            StatuteNode::Leaf(paragraphs) => {
                out.push_str(&paragraphs.join("\n"));
                out.push_str("\n\n");
            }
            StatuteNode::Branch(children) => {
                for (heading, node) in children {
                    out.push_str(heading);
                    out.push('\n');
                    node.render_into(out);
                }
            }
        }
    }
}

impl TryFrom<Value> for StatuteNode {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(heading, v)| Ok((heading, StatuteNode::try_from(v)?)))
                .collect::<Result<Vec<_>, String>>()
                .map(StatuteNode::Branch),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(format!("paragraph must be a string, got {other}")),
                })
                .collect::<Result<Vec<_>, String>>()
                .map(StatuteNode::Leaf),
            Value::String(s) => Ok(StatuteNode::Leaf(vec![s])),
            other => Err(format!("expected section object or paragraph list, got {other}")),
        }
    }
}

impl From<StatuteNode> for Value {
    fn from(node: StatuteNode) -> Self {
        match node {
            StatuteNode::Leaf(paragraphs) => {
                Value::Array(paragraphs.into_iter().map(Value::String).collect())
            }
            StatuteNode::Branch(children) => Value::Object(
                children
                    .into_iter()
                    .map(|(heading, n)| (heading, Value::from(n)))
                    .collect(),
            ),
        }
    }
}
