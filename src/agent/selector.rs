use tracing::{debug, info};

use crate::index::types::StatuteRef;
use crate::index::{CategoryIndex, CategoryPath};
use crate::llm::ModelTier;

use super::error::AgentError;
use super::gateway::ModelGateway;
use super::memory::ConversationMemory;
use super::prompts::{self, NOTHING_FOUND};
use super::schema::{Field, OutputSchema};
use super::types::TrailEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Found(StatuteRef),
    NotFound,
}

/// Let the model pick one statute filed under `path`, or none.
pub async fn choose_statute(
    gateway: &ModelGateway,
    memory: &mut ConversationMemory,
    index: &CategoryIndex,
    path: &CategoryPath,
    context: &str,
    trail: &[TrailEntry],
) -> Result<Selection, AgentError> {
    let candidates: Vec<StatuteRef> = index.statutes(path).into_iter().map(StatuteRef::from).collect();
    if candidates.is_empty() {
        debug!(path = %path.display(), "no statutes under category");
        return Ok(Selection::NotFound);
    }

    let schema = OutputSchema::new(
        "gesetz",
        vec![
            Field::keyword(
                "nummer",
                format!("Gesetzesnummer des gewaehlten Gesetzes oder '{NOTHING_FOUND}'"),
                candidates
                    .iter()
                    .map(|c| c.id.as_str())
                    .chain(std::iter::once(NOTHING_FOUND)),
            ),
            Field::text(
                "titel",
                format!("Titel des gewaehlten Gesetzes oder '{NOTHING_FOUND}'"),
            ),
        ],
    );
    let listed: Vec<String> = candidates.iter().map(StatuteRef::display).collect();
    let searched: Vec<String> = trail.iter().map(TrailEntry::display).collect();
    let prompt = prompts::choose_statute(context, &listed, &searched, &schema.render());

    let reply = gateway.ask(memory, &prompt, &schema, ModelTier::Small).await?;
    let id = reply.text("nummer");
    let title = reply.text("titel");
    if id.eq_ignore_ascii_case(NOTHING_FOUND) || title.trim().eq_ignore_ascii_case(NOTHING_FOUND) {
        info!(path = %path.display(), "no fitting statute in category");
        return Ok(Selection::NotFound);
    }

    let statute = candidates
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| AgentError::Invariant(format!("validated statute id {id} not listed")))?;
    info!(statute_id = %statute.id, title = %statute.title, "statute chosen");
    Ok(Selection::Found(statute))
}
