use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{ChatModel, LlmError, Message, ModelTier};
use crate::state::AgentConfig;

use super::error::AgentError;
use super::memory::ConversationMemory;
use super::parse::{clean_text, parse_reply};
use super::prompts;
use super::schema::{OutputSchema, Reply};

/// Single entry point for model calls: cleans prompts, records the exchange,
/// falls back to the large tier and enforces output schemas.
pub struct ModelGateway {
    model: Arc<dyn ChatModel>,
    call_delay: Duration,
    max_schema_retries: u32,
}

impl ModelGateway {
    pub fn new(model: Arc<dyn ChatModel>, config: &AgentConfig) -> Self {
        Self {
            model,
            call_delay: config.call_delay,
            max_schema_retries: config.max_schema_retries,
        }
    }

    /// Send `prompt` after the active window and parse the reply as JSON.
    pub async fn complete(
        &self,
        memory: &mut ConversationMemory,
        prompt: &str,
        tier: ModelTier,
    ) -> Result<Value, AgentError> {
        let outgoing = Message::user(clean_text(prompt));
        let mut request = memory.window().to_vec();
        request.push(outgoing.clone());

        let response = match self.model.chat(&request, tier).await {
            Err(LlmError::ContextLength(detail)) if tier == ModelTier::Small => {
                warn!(
                    window = request.len(),
                    detail = %detail.chars().take(200).collect::<String>(),
                    "request too large for small model, retrying on large tier"
                );
                self.model.chat(&request, ModelTier::Large).await?
            }
            other => other?,
        };

        debug!(?tier, response_len = response.len(), "─── LLM Response ───");
        for line in response.lines().take(20) {
            debug!("  │ {}", line);
        }

        memory.add_message(outgoing);
        memory.add_message(Message::assistant(response.clone()));

        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }

        parse_reply(&response)
            .ok_or_else(|| AgentError::Malformed(response.chars().take(300).collect()))
    }

    /// Like [`complete`](Self::complete), but re-prompts with a corrective
    /// instruction until the reply satisfies `schema` or the retry bound is hit.
    pub async fn ask(
        &self,
        memory: &mut ConversationMemory,
        prompt: &str,
        schema: &OutputSchema,
        tier: ModelTier,
    ) -> Result<Reply, AgentError> {
        let mut message = prompt.to_string();
        let mut attempt = 0u32;

        loop {
            let violation = match self.complete(memory, &message, tier).await {
                Ok(value) => match schema.validate(&value) {
                    Ok(reply) => return Ok(reply),
                    Err(v) => v.to_string(),
                },
                Err(AgentError::Malformed(raw)) => format!("not a JSON object: {raw}"),
                Err(e) => return Err(e),
            };

            if attempt >= self.max_schema_retries {
                return Err(AgentError::SchemaExhausted {
                    step: schema.step,
                    attempts: attempt + 1,
                    detail: violation,
                });
            }
            attempt += 1;
            warn!(step = schema.step, attempt, %violation, "reply violated output schema, retrying");
            message = prompts::schema_retry(&schema.render());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::schema::Field;
    use crate::testing::{gateway, ScriptedModel};
    use serde_json::json;

    fn category_schema() -> OutputSchema {
        OutputSchema::new(
            "kategorie",
            vec![Field::one_of("kategorie", "gewaehlte Kategorie", ["1 Verkehr", "2 Arbeit"])],
        )
    }

    #[tokio::test]
    async fn complete_records_exchange_and_cleans_prompt() {
        let model = Arc::new(ScriptedModel::new().with_reply(json!({"ok": "ja"})));
        let gw = gateway(model.clone());
        let mut memory = ConversationMemory::new("system");

        let value = gw
            .complete(&mut memory, "Frage ✅ zu § 20", ModelTier::Small)
            .await
            .unwrap();

        assert_eq!(value, json!({"ok": "ja"}));
        assert_eq!(memory.window().len(), 3);
        assert_eq!(memory.window()[1], Message::user("Frage  zu § 20"));
        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0.len(), 2);
        assert_eq!(requests[0].1, ModelTier::Small);
    }

    #[tokio::test]
    async fn complete_falls_back_to_large_tier() {
        let model = Arc::new(
            ScriptedModel::new()
                .with_error(LlmError::ContextLength("maximum context length".into()))
                .with_reply(json!({"ok": "ja"})),
        );
        let gw = gateway(model.clone());
        let mut memory = ConversationMemory::new("system");

        gw.complete(&mut memory, "lange Frage", ModelTier::Small)
            .await
            .unwrap();

        let tiers: Vec<ModelTier> = model.requests().into_iter().map(|(_, t)| t).collect();
        assert_eq!(tiers, vec![ModelTier::Small, ModelTier::Large]);
        // the failed attempt leaves no trace in memory
        assert_eq!(memory.history().len(), 3);
    }

    #[tokio::test]
    async fn large_tier_overflow_propagates() {
        let model = Arc::new(
            ScriptedModel::new().with_error(LlmError::ContextLength("too long".into())),
        );
        let gw = gateway(model);
        let mut memory = ConversationMemory::new("system");

        let err = gw
            .complete(&mut memory, "sehr lange Frage", ModelTier::Large)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Llm(LlmError::ContextLength(_))));
        assert_eq!(memory.history().len(), 1);
    }

    #[tokio::test]
    async fn complete_surfaces_malformed_reply() {
        let model = Arc::new(ScriptedModel::new().with_raw("Ich denke, 1 Verkehr passt."));
        let gw = gateway(model);
        let mut memory = ConversationMemory::new("system");

        let err = gw
            .complete(&mut memory, "Frage", ModelTier::Small)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Malformed(_)));
        // the exchange is still part of the conversation
        assert_eq!(memory.window().len(), 3);
    }

    #[tokio::test]
    async fn complete_is_deterministic_for_identical_input() {
        let reply = json!({"kategorie": "1 Verkehr"});
        let model = Arc::new(
            ScriptedModel::new()
                .with_reply(reply.clone())
                .with_reply(reply.clone()),
        );
        let gw = gateway(model.clone());
        let mut first = ConversationMemory::new("system");
        let mut second = ConversationMemory::new("system");

        let a = gw.complete(&mut first, "Frage", ModelTier::Small).await.unwrap();
        let b = gw.complete(&mut second, "Frage", ModelTier::Small).await.unwrap();

        assert_eq!(a, b);
        let requests = model.requests();
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn ask_retries_after_schema_violation() {
        let model = Arc::new(
            ScriptedModel::new()
                .with_reply(json!({"kategorie": "3 Steuern"}))
                .with_raw("Entschuldigung, hier nochmal.")
                .with_reply(json!({"kategorie": "2 Arbeit"})),
        );
        let gw = gateway(model.clone());
        let mut memory = ConversationMemory::new("system");

        let reply = gw
            .ask(&mut memory, "Waehle", &category_schema(), ModelTier::Small)
            .await
            .unwrap();

        assert_eq!(reply.text("kategorie"), "2 Arbeit");
        let requests = model.requests();
        assert_eq!(requests.len(), 3);
        let corrective = &requests[1].0.last().unwrap().content;
        assert!(corrective.contains("nicht dem geforderten Schema"));
        // corrective prompts continue the same conversation
        assert_eq!(requests[2].0.len(), 6);
    }

    #[tokio::test]
    async fn ask_gives_up_after_retry_bound() {
        let model = Arc::new(
            ScriptedModel::new()
                .with_reply(json!({"falsch": 1}))
                .with_reply(json!({"falsch": 2}))
                .with_reply(json!({"falsch": 3}))
                .with_reply(json!({"falsch": 4})),
        );
        let gw = gateway(model.clone());
        let mut memory = ConversationMemory::new("system");

        let err = gw
            .ask(&mut memory, "Waehle", &category_schema(), ModelTier::Small)
            .await
            .unwrap_err();

        match err {
            AgentError::SchemaExhausted { step, attempts, .. } => {
                assert_eq!(step, "kategorie");
                assert_eq!(attempts, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(model.remaining(), 0);
    }
}
