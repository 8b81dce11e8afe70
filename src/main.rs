mod agent;
mod index;
mod llm;
mod records;
mod state;
#[cfg(test)]
mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, Level};

use agent::gateway::ModelGateway;
use agent::types::{RunOutcome, RunRecord};
use agent::LawAgent;
use index::source::DiskStatuteSource;
use index::CategoryIndex;
use llm::LlmClient;
use records::RecordStore;
use state::AgentConfig;

/// Answer a question about Austrian federal law from statute text.
#[derive(Debug, Parser)]
#[command(name = "ris-agent", version)]
struct Cli {
    /// The legal question, in German.
    #[arg(required_unless_present = "replay", num_args = 1..)]
    question: Vec<String>,

    /// Print a saved run record instead of asking a new question.
    #[arg(long, value_name = "RECORD")]
    replay: Option<PathBuf>,

    /// Category index JSON.
    #[arg(long, env = "RIS_INDEX_PATH", default_value = "./data/index.json")]
    index: PathBuf,

    /// Directory of cached statute structures (`<id>.json`).
    #[arg(long, env = "RIS_STATUTE_DIR", default_value = "./data/statutes")]
    statutes: PathBuf,

    /// Where run records are written.
    #[arg(long, env = "RIS_RECORDS_DIR", default_value = "./data/records")]
    records: PathBuf,

    #[arg(long)]
    max_iterations: Option<u32>,

    #[arg(long)]
    max_schema_retries: Option<u32>,

    #[arg(long)]
    max_term_depth: Option<u32>,

    #[arg(long)]
    call_delay_ms: Option<u64>,

    /// Log prompts and responses.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> AgentConfig {
        let defaults = AgentConfig::default();
        AgentConfig {
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            max_schema_retries: self
                .max_schema_retries
                .unwrap_or(defaults.max_schema_retries),
            max_term_depth: self.max_term_depth.unwrap_or(defaults.max_term_depth),
            call_delay: self
                .call_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.call_delay),
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load env before clap so RIS_* values from .env are seen
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    if let Some(path) = &cli.replay {
        let record = RecordStore::load(path).await?;
        print_record(&record, path);
        return Ok(());
    }

    let question = cli.question.join(" ");
    if question.trim().is_empty() {
        bail!("question must not be empty");
    }
    let config = cli.config();

    let index = Arc::new(
        CategoryIndex::load(&cli.index)
            .await
            .with_context(|| format!("Failed to load index from {}", cli.index.display()))?,
    );
    let source = Arc::new(DiskStatuteSource::new(&cli.statutes));
    let records = RecordStore::new(&cli.records);
    let llm_client = Arc::new(LlmClient::from_env()?);
    info!("LLM client initialized");

    let gateway = ModelGateway::new(llm_client, &config);
    let agent = LawAgent::new(gateway, index, source, records.clone(), config);

    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let record = agent.run_interruptible(&question, interrupt).await?;

    print_record(&record, &records.path_for(&record.question));
    Ok(())
}

fn print_record(record: &RunRecord, path: &Path) {
    match &record.final_report {
        Some(report) => {
            println!("{}\n", report.plain_answer);
            println!("Kurz: {}", report.short_answer);
        }
        None => match &record.outcome {
            RunOutcome::NoAnswerFound => println!(
                "Keine Antwort nach {} Durchgaengen gefunden.",
                record.iterations
            ),
            RunOutcome::Interrupted => println!("Abgebrochen."),
            RunOutcome::SchemaExhausted { step } => {
                println!("Das Modell lieferte im Schritt '{step}' keine gueltige Antwort.")
            }
            RunOutcome::Aborted { reason } => println!("Fehler: {reason}"),
            RunOutcome::Answered => {}
        },
    }

    for (term, resolved) in &record.resolved_terms {
        match &resolved.report {
            Some(report) => println!("\n{term}: {}", report.plain_answer),
            None => println!("\n{term}: (keine Erklaerung gefunden)"),
        }
    }

    println!("\nProtokoll: {}", path.display());
}
