pub mod analysis;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod navigator;
pub mod parse;
pub mod prompts;
pub mod report;
pub mod schema;
pub mod sections;
pub mod selector;
pub mod summary;
pub mod terms;
pub mod types;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use tracing::{error, info, warn};

use crate::index::source::StatuteSource;
use crate::index::CategoryIndex;
use crate::records::RecordStore;
use crate::state::AgentConfig;

use error::AgentError;
use gateway::ModelGateway;
use memory::ConversationMemory;
use selector::Selection;
use types::{
    Analysis, Decision, FinalReport, ProgressSummary, ResolvedTerm, RunOutcome, RunRecord,
    TrailEntry,
};

/// Mutable state of one run, owned by that run alone.
#[derive(Debug)]
pub struct RunState {
    pub question: String,
    pub depth: u32,
    pub started_at: DateTime<Utc>,
    pub memory: ConversationMemory,
    pub iterations: u32,
    pub trail: Vec<TrailEntry>,
    pub progress: ProgressSummary,
    pub last_analysis: Option<Analysis>,
    pub report: Option<FinalReport>,
    pub resolved_terms: BTreeMap<String, ResolvedTerm>,
}

impl RunState {
    pub fn new(question: impl Into<String>, depth: u32) -> Self {
        Self {
            question: question.into(),
            depth,
            started_at: Utc::now(),
            memory: ConversationMemory::new(prompts::SYSTEM_PROMPT),
            iterations: 0,
            trail: Vec::new(),
            progress: ProgressSummary::default(),
            last_analysis: None,
            report: None,
            resolved_terms: BTreeMap::new(),
        }
    }

    /// Question plus latest summary, prefixed to the statute and section prompts.
    fn context(&self) -> String {
        prompts::question_context(&self.question, &self.progress.summary)
    }

    fn into_record(self, outcome: RunOutcome) -> RunRecord {
        RunRecord {
            question: self.question,
            depth: self.depth,
            started_at: self.started_at,
            finished_at: Utc::now(),
            iterations: self.iterations,
            outcome,
            search_trail: self.trail,
            progress_summary: self.progress,
            last_analysis: self.last_analysis,
            final_report: self.report,
            resolved_terms: self.resolved_terms,
            full_history: self.memory.into_history(),
        }
    }
}

/// Answers legal questions by navigating the index, reading statutes and
/// explaining jargon through nested runs.
pub struct LawAgent {
    gateway: ModelGateway,
    index: Arc<CategoryIndex>,
    source: Arc<dyn StatuteSource>,
    records: RecordStore,
    config: AgentConfig,
}

impl LawAgent {
    pub fn new(
        gateway: ModelGateway,
        index: Arc<CategoryIndex>,
        source: Arc<dyn StatuteSource>,
        records: RecordStore,
        config: AgentConfig,
    ) -> Self {
        Self {
            gateway,
            index,
            source,
            records,
            config,
        }
    }

    /// Run `question` to completion. Always yields a saved record; `Err`
    /// only when the record itself could not be written.
    pub async fn run(&self, question: &str) -> Result<RunRecord> {
        self.run_at_depth(question.to_string(), 0).await
    }

    /// Like [`run`](Self::run), but stops early when `interrupt` resolves and
    /// saves whatever state was reached.
    pub async fn run_interruptible(
        &self,
        question: &str,
        interrupt: impl Future<Output = ()>,
    ) -> Result<RunRecord> {
        let mut state = RunState::new(question, 0);
        let outcome = tokio::select! {
            biased;
            _ = interrupt => {
                warn!("run interrupted, saving partial state");
                RunOutcome::Interrupted
            }
            res = self.drive(&mut state) => settle(res),
        };
        self.finish(state, outcome).await
    }

    fn run_at_depth(&self, question: String, depth: u32) -> BoxFuture<'_, Result<RunRecord>> {
        async move {
            info!(depth, question = %question, "run started");
            let mut state = RunState::new(question, depth);
            let outcome = settle(self.drive(&mut state).await);
            self.finish(state, outcome).await
        }
        .boxed()
    }

    async fn finish(&self, state: RunState, outcome: RunOutcome) -> Result<RunRecord> {
        let record = state.into_record(outcome);
        info!(
            depth = record.depth,
            iterations = record.iterations,
            answered = record.is_answered(),
            outcome = ?record.outcome,
            "run finished"
        );
        self.records.save(&record).await?;
        Ok(record)
    }

    async fn drive(&self, state: &mut RunState) -> Result<RunOutcome, AgentError> {
        while state.iterations < self.config.max_iterations {
            state.iterations += 1;
            info!(iteration = state.iterations, depth = state.depth, "navigation round");

            let path = navigator::define_layers(
                &self.gateway,
                &mut state.memory,
                &self.index,
                &state.question,
            )
            .await?;
            info!(path = %path.display(), "category path defined");
            self.checkpoint(state).await?;

            let context = state.context();
            let selection = selector::choose_statute(
                &self.gateway,
                &mut state.memory,
                &self.index,
                &path,
                &context,
                &state.trail,
            )
            .await?;
            self.checkpoint(state).await?;

            let statute = match selection {
                Selection::Found(statute) => statute,
                Selection::NotFound => continue,
            };

            let context = state.context();
            let resolved = match sections::resolve_structure(
                &self.gateway,
                &mut state.memory,
                self.source.as_ref(),
                &statute,
                &context,
                self.config.long_statute_threshold,
            )
            .await
            {
                Ok(resolved) => resolved,
                Err(AgentError::StatuteUnavailable { id, reason }) => {
                    warn!(statute_id = %id, %reason, "statute unavailable, searching on");
                    state.trail.push(TrailEntry::new(&statute, None));
                    continue;
                }
                Err(e) => return Err(e),
            };

            let analysis = analysis::analyze(
                &self.gateway,
                &mut state.memory,
                &statute,
                &resolved,
                &context,
            )
            .await?;
            let section = analysis.section.clone().or_else(|| resolved.section());
            state.trail.push(TrailEntry::new(&statute, section));
            let decision = analysis.next_step;
            state.last_analysis = Some(analysis);

            match decision {
                Decision::ContinueSearch => self.checkpoint(state).await?,
                Decision::Done => {
                    let report = report::create_final_report(&self.gateway, &mut state.memory).await?;
                    state.report = Some(report);
                    if state.depth < self.config.max_term_depth {
                        if let Err(e) = self.resolve_terms(state).await {
                            warn!(error = %e, "term resolution failed, keeping report");
                        }
                    }
                    return Ok(RunOutcome::Answered);
                }
            }
        }

        info!(
            iterations = state.iterations,
            trail = state.trail.len(),
            "iteration budget exhausted without an answer"
        );
        Ok(RunOutcome::NoAnswerFound)
    }

    /// Summarise, then shrink the window back to the preamble.
    async fn checkpoint(&self, state: &mut RunState) -> Result<(), AgentError> {
        state.progress = summary::summarize(&self.gateway, &mut state.memory).await?;
        state.memory.reset_window(self.config.echo_resets);
        Ok(())
    }

    async fn resolve_terms(&self, state: &mut RunState) -> Result<(), AgentError> {
        let Some(report) = state.report.clone() else {
            return Ok(());
        };
        state.memory.reset_window(self.config.echo_resets);

        let found = terms::extract_terms(&self.gateway, &mut state.memory, &report).await?;
        if found.is_empty() {
            return Ok(());
        }
        let questions = terms::generate_questions(&self.gateway, &mut state.memory, &found).await?;

        for (term, question) in questions {
            info!(term = %term, depth = state.depth + 1, "resolving term");
            let resolved = match self.run_at_depth(question.clone(), state.depth + 1).await {
                Ok(record) => ResolvedTerm {
                    question,
                    outcome: record.outcome,
                    report: record.final_report,
                },
                Err(e) => {
                    warn!(term = %term, error = %e, "nested run could not be saved");
                    ResolvedTerm {
                        question,
                        outcome: RunOutcome::Aborted {
                            reason: format!("{e:#}"),
                        },
                        report: None,
                    }
                }
            };
            state.resolved_terms.insert(term, resolved);
        }
        Ok(())
    }
}

fn settle(res: Result<RunOutcome, AgentError>) -> RunOutcome {
    match res {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "run aborted");
            RunOutcome::from(&e)
        }
    }
}
