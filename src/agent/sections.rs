use tracing::{debug, info};

use crate::index::source::StatuteSource;
use crate::index::types::{StatuteNode, StatuteRef};
use crate::llm::ModelTier;

use super::error::AgentError;
use super::gateway::ModelGateway;
use super::memory::ConversationMemory;
use super::prompts;
use super::schema::{Field, OutputSchema};

/// Text the analysis step works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedText {
    /// Headings chosen on the way down; empty for a whole statute.
    pub headings: Vec<String>,
    pub text: String,
    pub whole_statute: bool,
    /// Section choices made by the model.
    pub rounds: u32,
}

impl ResolvedText {
    pub fn section(&self) -> Option<String> {
        (!self.headings.is_empty()).then(|| self.headings.join(" > "))
    }
}

/// Narrow a statute down to a text short enough to analyse. Short statutes
/// are returned whole; long ones are descended heading by heading until a
/// leaf is reached.
pub async fn resolve_structure(
    gateway: &ModelGateway,
    memory: &mut ConversationMemory,
    source: &dyn StatuteSource,
    statute: &StatuteRef,
    context: &str,
    threshold: usize,
) -> Result<ResolvedText, AgentError> {
    let structure = source
        .structure(&statute.id)
        .await
        .map_err(|e| AgentError::StatuteUnavailable {
            id: statute.id.clone(),
            reason: format!("{e:#}"),
        })?;

    let size = structure.serialized_len();
    if size <= threshold {
        debug!(statute_id = %statute.id, size, "statute short enough to analyse whole");
        return Ok(ResolvedText {
            headings: Vec::new(),
            text: structure.render(),
            whole_statute: true,
            rounds: 0,
        });
    }

    let display = statute.display();
    let mut node = &structure;
    let mut headings: Vec<String> = Vec::new();
    loop {
        let options = match node {
            StatuteNode::Leaf(paragraphs) => {
                return Ok(ResolvedText {
                    rounds: headings.len() as u32,
                    headings,
                    text: paragraphs.join("\n"),
                    whole_statute: false,
                });
            }
            StatuteNode::Branch(_) => node.headings(),
        };
        if options.is_empty() {
            return Err(AgentError::Invariant(format!(
                "statute {} has an empty section at {:?}",
                statute.id, headings
            )));
        }

        let schema = OutputSchema::new(
            "sektion",
            vec![Field::one_of(
                "gewaehlte_sektion",
                "Abschnitt (ganze Zeile zitiert!)",
                options.iter().copied(),
            )],
        );
        let prompt = prompts::choose_section(context, &display, &options, &schema.render());
        let reply = gateway.ask(memory, &prompt, &schema, ModelTier::Large).await?;
        let chosen = reply.text("gewaehlte_sektion").to_string();
        info!(statute_id = %statute.id, section = %chosen, "section chosen");

        node = node.child(&chosen).ok_or_else(|| {
            AgentError::Invariant(format!(
                "validated section {chosen:?} missing from statute {}",
                statute.id
            ))
        })?;
        headings.push(chosen);
    }
}
