use tracing::info;

use crate::index::{CategoryIndex, CategoryPath};
use crate::llm::ModelTier;

use super::error::AgentError;
use super::gateway::ModelGateway;
use super::memory::ConversationMemory;
use super::prompts;
use super::schema::{Field, OutputSchema};

const MAX_ROUNDS: usize = 3;

/// Walk the category index one level per round until a statute list is reached.
pub async fn define_layers(
    gateway: &ModelGateway,
    memory: &mut ConversationMemory,
    index: &CategoryIndex,
    question: &str,
) -> Result<CategoryPath, AgentError> {
    let mut layers: Vec<String> = Vec::with_capacity(MAX_ROUNDS);

    for round in 1..=MAX_ROUNDS {
        let Some(options) = index.labels(&layers) else {
            break;
        };
        if options.is_empty() {
            return Err(AgentError::Invariant(format!(
                "category {:?} has no subcategories",
                layers
            )));
        }

        let context = match layers.last() {
            None => format!("Zu beantwortende Rechtsfrage: {question}"),
            Some(previous) => format!("Du hast {previous} gewaehlt."),
        };
        let examples = example_answers(&options);
        let schema = OutputSchema::new(
            "kategorie",
            vec![Field::one_of(
                "kategorie",
                "gewaehlte Kategorie inklusive voranstehende Zahl",
                options.iter().copied(),
            )],
        );
        let prompt = prompts::choose_category(&context, &options, &examples, &schema.render());

        let reply = gateway.ask(memory, &prompt, &schema, ModelTier::Small).await?;
        let chosen = reply.text("kategorie").to_string();
        info!(round, category = %chosen, "category chosen");

        layers.push(chosen);
        if index.node(&layers).is_none() {
            return Err(AgentError::Invariant(format!(
                "chosen category path {:?} is not in the index",
                layers
            )));
        }
    }

    index
        .path(layers)
        .map_err(|e| AgentError::Invariant(e.to_string()))
}

/// Two valid answers built from the first and the middle option.
fn example_answers(options: &[&str]) -> Vec<String> {
    let first = options.first().copied().unwrap_or_default();
    let middle = options.get(options.len() / 2).copied().unwrap_or(first);
    [first, middle]
        .iter()
        .map(|o| serde_json::json!({ "kategorie": o }).to_string())
        .collect()
}
