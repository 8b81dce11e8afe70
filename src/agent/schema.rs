//! Declarative output contracts shared by prompt construction and reply
//! validation.

use serde_json::{Map, Value};
use thiserror::Error;

use super::parse::clean_text;

/// What a single field of a reply must satisfy.
#[derive(Debug, Clone)]
pub enum Check {
    /// Any non-empty string.
    Text,
    /// One of the given strings, matched as the model sees them in a cleaned
    /// prompt. The stored spelling is returned.
    OneOf { options: Vec<String>, ignore_case: bool },
    /// A list of strings.
    TextList { allow_empty: bool },
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub description: String,
    pub check: Check,
}

impl Field {
    pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            check: Check::Text,
        }
    }

    pub fn one_of(
        name: impl Into<String>,
        description: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            check: Check::OneOf {
                options: options.into_iter().map(Into::into).collect(),
                ignore_case: false,
            },
        }
    }

    /// Enumerated keyword, compared case-insensitively.
    pub fn keyword(
        name: impl Into<String>,
        description: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            check: Check::OneOf {
                options: options.into_iter().map(Into::into).collect(),
                ignore_case: true,
            },
        }
    }

    pub fn list(name: impl Into<String>, description: impl Into<String>, allow_empty: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            check: Check::TextList { allow_empty },
        }
    }

    fn validate(&self, value: Option<&Value>) -> Result<Value, SchemaViolation> {
        let value = value.ok_or_else(|| SchemaViolation::Missing(self.name.clone()))?;
        match &self.check {
            Check::Text => match value.as_str().map(str::trim) {
                Some(s) if !s.is_empty() => Ok(Value::String(s.to_string())),
                _ => Err(SchemaViolation::Invalid {
                    field: self.name.clone(),
                    reason: "expected a non-empty string".to_string(),
                }),
            },
            Check::OneOf { options, ignore_case } => {
                let given = value.as_str().map(str::trim).ok_or_else(|| {
                    SchemaViolation::Invalid {
                        field: self.name.clone(),
                        reason: "expected a string".to_string(),
                    }
                })?;
                let wanted = comparable(given, *ignore_case);
                options
                    .iter()
                    .find(|o| comparable(o, *ignore_case) == wanted)
                    .map(|o| Value::String(o.clone()))
                    .ok_or_else(|| SchemaViolation::NotAnOption {
                        field: self.name.clone(),
                        given: given.to_string(),
                    })
            }
            Check::TextList { allow_empty } => {
                let items = value.as_array().ok_or_else(|| SchemaViolation::Invalid {
                    field: self.name.clone(),
                    reason: "expected a list of strings".to_string(),
                })?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str().map(str::trim) {
                        Some("") => {}
                        Some(s) => out.push(Value::String(s.to_string())),
                        None => {
                            return Err(SchemaViolation::Invalid {
                                field: self.name.clone(),
                                reason: "list entries must be strings".to_string(),
                            })
                        }
                    }
                }
                if out.is_empty() && !allow_empty {
                    return Err(SchemaViolation::Invalid {
                        field: self.name.clone(),
                        reason: "list must not be empty".to_string(),
                    });
                }
                Ok(Value::Array(out))
            }
        }
    }
}

/// An option as the model sees it in a cleaned prompt: unsafe characters
/// dropped, whitespace runs collapsed.
fn comparable(text: &str, ignore_case: bool) -> String {
    let shown = clean_text(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if ignore_case {
        shown.to_lowercase()
    } else {
        shown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("field `{0}` is missing")]
    Missing(String),

    #[error("field `{field}`: {reason}")]
    Invalid { field: String, reason: String },

    #[error("field `{field}`: `{given}` is not one of the offered options")]
    NotAnOption { field: String, given: String },
}

/// Expected reply shape of one model-mediated step.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub step: &'static str,
    fields: Vec<Field>,
}

impl OutputSchema {
    pub fn new(step: &'static str, fields: Vec<Field>) -> Self {
        Self { step, fields }
    }

    /// The field → description mapping embedded in prompts.
    pub fn render(&self) -> String {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| {
                let shown = match f.check {
                    Check::TextList { .. } => Value::Array(vec![
                        Value::String(f.description.clone()),
                        Value::String("...".to_string()),
                    ]),
                    _ => Value::String(f.description.clone()),
                };
                (f.name.clone(), shown)
            })
            .collect();
        Value::Object(map).to_string()
    }

    /// Check a parsed reply. Choice fields come back exactly as offered, so
    /// they can be used as lookup keys.
    pub fn validate(&self, value: &Value) -> Result<Reply, SchemaViolation> {
        let object = value.as_object().ok_or(SchemaViolation::NotAnObject)?;
        let mut fields = Map::new();
        for field in &self.fields {
            let checked = field.validate(object.get(&field.name))?;
            fields.insert(field.name.clone(), checked);
        }
        Ok(Reply { fields })
    }
}

/// A reply that passed its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    fields: Map<String, Value>,
}

impl Reply {
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).and_then(Value::as_str).unwrap_or("")
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
