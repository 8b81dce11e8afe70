use tracing::info;

use crate::llm::ModelTier;

use super::error::AgentError;
use super::gateway::ModelGateway;
use super::memory::ConversationMemory;
use super::prompts;
use super::schema::{Field, OutputSchema};
use super::types::FinalReport;

pub async fn create_final_report(
    gateway: &ModelGateway,
    memory: &mut ConversationMemory,
) -> Result<FinalReport, AgentError> {
    let schema = OutputSchema::new(
        "bericht",
        vec![
            Field::text("zusammenfassung", "wie die Antwort gefunden wurde"),
            Field::text("komplexe_antwort", "ausfuehrliche Antwort fuer Juristen"),
            Field::text("einfache_antwort", "verstaendliche Antwort fuer Laien"),
            Field::text("kurze_antwort", "ein einziger, eindeutiger Satz"),
            Field::text("begruendung", "Begruendung mit Verweis auf die Gesetzesstellen"),
        ],
    );
    let prompt = prompts::final_report(&schema.render());
    let reply = gateway.ask(memory, &prompt, &schema, ModelTier::Large).await?;

    let report = FinalReport {
        summary: reply.text("zusammenfassung").to_string(),
        detailed_answer: reply.text("komplexe_antwort").to_string(),
        plain_answer: reply.text("einfache_antwort").to_string(),
        short_answer: reply.text("kurze_antwort").to_string(),
        justification: reply.text("begruendung").to_string(),
    };
    info!(short_answer = %report.short_answer, "final report created");
    Ok(report)
}
