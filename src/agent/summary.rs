use tracing::info;

use crate::llm::ModelTier;

use super::error::AgentError;
use super::gateway::ModelGateway;
use super::memory::ConversationMemory;
use super::prompts;
use super::schema::{Field, OutputSchema};
use super::types::{Answered, ProgressSummary};

/// Compress the active window into a progress summary.
pub async fn summarize(
    gateway: &ModelGateway,
    memory: &mut ConversationMemory,
) -> Result<ProgressSummary, AgentError> {
    let schema = OutputSchema::new(
        "zusammenfassung",
        vec![
            Field::text("zusammenfassung", "Zusammenfassung des bisherigen Fortschritts"),
            Field::keyword(
                "frage_beantwortet",
                "'ja' oder 'noch nicht'",
                ["ja", "noch nicht"],
            ),
            Field::text("begruendung", "Begruendung"),
        ],
    );
    let prompt = prompts::summarize(&schema.render());
    let reply = gateway.ask(memory, &prompt, &schema, ModelTier::Small).await?;

    let answered = match reply.text("frage_beantwortet") {
        "ja" => Answered::Yes,
        _ => Answered::NotYet,
    };
    info!(?answered, "progress summarised");
    Ok(ProgressSummary {
        summary: reply.text("zusammenfassung").to_string(),
        answered,
        justification: reply.text("begruendung").to_string(),
    })
}
