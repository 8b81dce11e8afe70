use std::collections::HashSet;

use tracing::info;

use crate::llm::ModelTier;

use super::error::AgentError;
use super::gateway::ModelGateway;
use super::memory::ConversationMemory;
use super::prompts;
use super::schema::{Field, OutputSchema};
use super::types::FinalReport;

/// Jargon in the lay answer, deduplicated case-insensitively. May be empty.
pub async fn extract_terms(
    gateway: &ModelGateway,
    memory: &mut ConversationMemory,
    report: &FinalReport,
) -> Result<Vec<String>, AgentError> {
    let schema = OutputSchema::new(
        "fachbegriffe",
        vec![Field::list("fachbegriffe", "juristischer Fachbegriff", true)],
    );
    let prompt = prompts::extract_terms(&report.plain_answer, &schema.render());
    let reply = gateway.ask(memory, &prompt, &schema, ModelTier::Small).await?;

    let mut seen = HashSet::new();
    let mut terms = reply.list("fachbegriffe");
    terms.retain(|t| seen.insert(t.to_lowercase()));
    info!(count = terms.len(), "jargon terms extracted");
    Ok(terms)
}

/// One explanatory question per term, in term order.
pub async fn generate_questions(
    gateway: &ModelGateway,
    memory: &mut ConversationMemory,
    terms: &[String],
) -> Result<Vec<(String, String)>, AgentError> {
    if terms.is_empty() {
        return Ok(Vec::new());
    }
    let schema = OutputSchema::new(
        "fachbegriff_fragen",
        terms
            .iter()
            .map(|t| Field::text(t.as_str(), format!("Frage, die '{t}' erklaert")))
            .collect(),
    );
    let prompt = prompts::term_questions(terms, &schema.render());
    let reply = gateway.ask(memory, &prompt, &schema, ModelTier::Small).await?;

    Ok(terms
        .iter()
        .map(|t| (t.clone(), reply.text(t).to_string()))
        .collect())
}
