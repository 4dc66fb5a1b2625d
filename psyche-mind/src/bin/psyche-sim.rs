//! psyche-sim: drive agents from the command line.
//!
//! Chat input is read from stdin, one turn per line:
//! `intent<TAB>tone<TAB>message`. Each turn prints one JSON object; lines
//! that cannot be parsed or are rejected as invalid are reported on stderr
//! and skipped. With `--state`, the agent is saved even when the session
//! ends in an error.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use psyche_core::PsycheConfig;
use psyche_core::engine::TraitSource;
use psyche_core::evolution::EvolutionTrigger;
use psyche_core::types::AgentId;
use psyche_mind::{AgentSpec, MindError, Runtime, TurnRequest};

#[derive(Parser)]
#[command(name = "psyche-sim")]
#[command(author, version, about = "Personality-driven agent simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured archetypes
    Archetypes,

    /// Show preferred and avoided styles for an archetype
    Tendencies {
        /// Archetype id
        archetype: String,

        /// Agent profile key
        #[arg(short = 't', long, default_value = "mammal")]
        agent_type: String,
    },

    /// Chat with one agent over stdin
    Chat {
        /// Agent name
        #[arg(short, long, default_value = "Pip")]
        name: String,

        /// Agent profile key
        #[arg(short = 't', long, default_value = "mammal")]
        agent_type: String,

        /// Archetype id; neutral traits when omitted
        #[arg(short, long)]
        archetype: Option<String>,

        /// Relationship label sent with every turn
        #[arg(short, long, default_value = "neutral")]
        relationship: String,

        /// Load the agent from this snapshot and save it back afterwards
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Evolution trigger applied to every turn
        #[arg(long)]
        trigger: Option<String>,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<PsycheConfig> {
    match path {
        Some(p) => PsycheConfig::from_file(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(PsycheConfig::default()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_line(
    line: &str,
    relationship: &str,
    trigger: Option<EvolutionTrigger>,
) -> Result<TurnRequest> {
    let mut parts = line.splitn(3, '\t');
    let (Some(intent), Some(tone)) = (parts.next(), parts.next()) else {
        bail!("expected 'intent<TAB>tone<TAB>message', got '{line}'");
    };
    let message = parts.next().unwrap_or_default();
    let mut request = TurnRequest::new(message, intent, tone).with_memory(relationship, "");
    request.trigger_hint = trigger;
    Ok(request)
}

/// Run one turn per input line, writing each output as JSON. Returns the
/// number of turns that produced output.
async fn run_chat<R: BufRead, W: Write>(
    runtime: &Runtime,
    id: AgentId,
    input: R,
    mut out: W,
    relationship: &str,
    trigger: Option<EvolutionTrigger>,
) -> Result<usize> {
    let mut turns = 0;
    for (n, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let request = match parse_line(&line, relationship, trigger) {
            Ok(request) => request,
            Err(e) => {
                warn!(line = n + 1, error = %e, "Skipping unparseable line");
                continue;
            }
        };
        match runtime.turn(id, &request).await {
            Ok(output) => {
                writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
                turns += 1;
            }
            Err(MindError::Validation(reason)) => {
                warn!(line = n + 1, %reason, "Skipping invalid turn");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(turns)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_logging(&config.general.log_level, cli.json_logs);

    match cli.command {
        Commands::Archetypes => {
            let runtime = Runtime::from_config(config)?;
            print_json(&runtime.engine().archetypes().list())?;
        }

        Commands::Tendencies {
            archetype,
            agent_type,
        } => {
            let runtime = Runtime::from_config(config)?;
            let id = runtime.create_agent(&AgentSpec {
                name: archetype.clone(),
                agent_type,
                traits: TraitSource::Archetype(archetype),
            })?;
            print_json(&runtime.tendencies(id).await?)?;
        }

        Commands::Chat {
            name,
            agent_type,
            archetype,
            relationship,
            state,
            trigger,
        } => {
            let trigger = trigger
                .map(|t| t.parse::<EvolutionTrigger>())
                .transpose()?;
            let runtime = Runtime::from_config(config)?;
            let id = match state.as_deref().filter(|p| p.exists()) {
                Some(path) => runtime.load_agent(path)?,
                None => runtime.create_agent(&AgentSpec {
                    name,
                    agent_type,
                    traits: archetype.map_or(TraitSource::Neutral, TraitSource::Archetype),
                })?,
            };

            let session = run_chat(
                &runtime,
                id,
                std::io::stdin().lock(),
                std::io::stdout().lock(),
                &relationship,
                trigger,
            )
            .await;

            if let Some(path) = state {
                runtime.save_agent(id, &path).await?;
                info!(path = %path.display(), "Saved agent state");
            }
            let turns = session?;
            info!(turns, "Chat finished");
        }
    }
    Ok(())
}
