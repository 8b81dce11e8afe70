//! Deterministic stand-ins for the model and the statute source.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::agent::gateway::ModelGateway;
use crate::index::source::StatuteSource;
use crate::index::types::StatuteNode;
use crate::llm::{ChatModel, LlmError, Message, ModelTier};
use crate::state::AgentConfig;

/// Replays queued replies in order and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<(Vec<Message>, ModelTier)>>,
    stall: Option<Arc<Notify>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, value: Value) -> Self {
        self.with_raw(value.to_string())
    }

    pub fn with_raw(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn with_error(self, err: LlmError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    /// Once the script runs out, signal `notify` and hang instead of panicking.
    pub fn stalling(mut self, notify: Arc<Notify>) -> Self {
        self.stall = Some(notify);
        self
    }

    pub fn requests(&self) -> Vec<(Vec<Message>, ModelTier)> {
        self.requests.lock().unwrap().clone()
    }

    /// Last user prompt of every request.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|(messages, _)| messages.last().map(|m| m.content.clone()))
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, messages: &[Message], tier: ModelTier) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), tier));
        let next = self.replies.lock().unwrap().pop_front();
        match (next, &self.stall) {
            (Some(reply), _) => reply,
            (None, Some(notify)) => {
                notify.notify_one();
                std::future::pending().await
            }
            (None, None) => panic!("script exhausted; last prompt: {:?}", messages.last()),
        }
    }
}

/// Gateway without the courtesy delay.
pub fn gateway(model: Arc<ScriptedModel>) -> ModelGateway {
    ModelGateway::new(model, &test_config())
}

pub fn test_config() -> AgentConfig {
    AgentConfig {
        call_delay: Duration::ZERO,
        echo_resets: false,
        ..AgentConfig::default()
    }
}

/// Statute structures held in memory.
#[derive(Default)]
pub struct MemorySource {
    statutes: HashMap<String, StatuteNode>,
}

impl MemorySource {
    pub fn with(mut self, id: &str, structure: Value) -> Self {
        let node: StatuteNode = serde_json::from_value(structure).unwrap();
        self.statutes.insert(id.to_string(), node);
        self
    }
}

#[async_trait]
impl StatuteSource for MemorySource {
    async fn structure(&self, statute_id: &str) -> Result<StatuteNode> {
        self.statutes
            .get(statute_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown statute {statute_id}"))
    }
}
