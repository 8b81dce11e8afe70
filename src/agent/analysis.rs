use tracing::info;

use crate::index::types::StatuteRef;
use crate::llm::ModelTier;

use super::error::AgentError;
use super::gateway::ModelGateway;
use super::memory::ConversationMemory;
use super::prompts;
use super::schema::{Field, OutputSchema};
use super::sections::ResolvedText;
use super::types::{Analysis, Decision};

fn analysis_schema(fragment: bool) -> OutputSchema {
    let mut fields = vec![
        Field::keyword(
            "vermutung",
            "'ja' wenn der Text zur Beantwortung ausreicht, sonst 'nein'",
            ["ja", "nein"],
        ),
        Field::text("begruendung", "Begruendung der Einschaetzung"),
        Field::text("loesungsansatz", "wie die Rechtsfrage beantwortet werden kann"),
        Field::keyword(
            "naechster_schritt",
            "'neues_gesetz' um weiterzusuchen oder 'done' um den Bericht zu erstellen",
            ["neues_gesetz", "done"],
        ),
    ];
    if fragment {
        fields.push(Field::text(
            "analysierte_sektion",
            "Ueberschrift des analysierten Abschnitts",
        ));
    }
    OutputSchema::new("analyse", fields)
}

/// Judge whether `resolved` answers the question and whether to keep searching.
pub async fn analyze(
    gateway: &ModelGateway,
    memory: &mut ConversationMemory,
    statute: &StatuteRef,
    resolved: &ResolvedText,
    context: &str,
) -> Result<Analysis, AgentError> {
    let display = statute.display();
    let fragment = resolved.section();
    let (schema, prompt) = match &fragment {
        None => {
            let schema = analysis_schema(false);
            let prompt = prompts::analyze_full(context, &display, &resolved.text, &schema.render());
            (schema, prompt)
        }
        Some(section) => {
            let schema = analysis_schema(true);
            let prompt = prompts::analyze_section(
                context,
                &display,
                section,
                &resolved.text,
                &schema.render(),
            );
            (schema, prompt)
        }
    };

    let reply = gateway.ask(memory, &prompt, &schema, ModelTier::Large).await?;
    let next_step = match reply.text("naechster_schritt") {
        "done" => Decision::Done,
        _ => Decision::ContinueSearch,
    };
    let section = fragment.map(|_| reply.text("analysierte_sektion").to_string());

    let analysis = Analysis {
        sufficient: reply.text("vermutung") == "ja",
        rationale: reply.text("begruendung").to_string(),
        proposed_approach: reply.text("loesungsansatz").to_string(),
        next_step,
        section,
    };
    info!(
        statute_id = %statute.id,
        sufficient = analysis.sufficient,
        next_step = ?analysis.next_step,
        "statute analysed"
    );
    Ok(analysis)
}
