use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The reply could not be read as a JSON object.
    #[error("model reply is not a JSON object: {0}")]
    Malformed(String),

    #[error("step `{step}` gave no valid reply after {attempts} attempts: {detail}")]
    SchemaExhausted {
        step: &'static str,
        attempts: u32,
        detail: String,
    },

    #[error("structure of statute {id} unavailable: {reason}")]
    StatuteUnavailable { id: String, reason: String },

    /// Validated data contradicts the index or a statute structure.
    #[error("invariant violated: {0}")]
    Invariant(String),
}
