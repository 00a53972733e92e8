//! CLI entry point for runway.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use runway_core::{validate, ModelHistory};
use runway_cypher::IngestionStrategy;

use runway_cli::commands::{append_models, open_history, read_columns, read_model, render, Export};
use runway_cli::config::RunwayConfig;
use runway_cli::drafts::refine_drafts;
use runway_cli::error::CliError;

#[derive(Parser)]
#[command(name = "runway")]
#[command(about = "Validate graph data models and export Cypher ingestion code")]
struct Cli {
    /// Config file prefix (default: runway).
    #[arg(short, long, default_value = "runway")]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a model against the allowed columns and list every violation.
    Validate {
        #[arg(short, long)]
        model: PathBuf,
        #[arg(long)]
        columns: PathBuf,
    },
    /// Print uniqueness constraint DDL.
    Constraints(ExportArgs),
    /// Print the node and relationship load statements.
    Script(ExportArgs),
    /// Print a YAML loader config.
    LoaderConfig(ExportArgs),
    /// Print the structured model document.
    Document(ExportArgs),
    /// Print the model as diagram JSON.
    Diagram(ExportArgs),
    /// Try draft files in order until one validates.
    Refine {
        /// Draft model documents, tried in the order given.
        #[arg(short, long = "draft", required = true)]
        drafts: Vec<PathBuf>,
        #[arg(long)]
        columns: PathBuf,
        /// Correction rounds after the first draft (default from config).
        #[arg(long)]
        max_retries: Option<usize>,
        /// History file to append the accepted model to.
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ExportArgs {
    /// Model documents, validated and appended in order.
    #[arg(short, long = "model")]
    models: Vec<PathBuf>,

    /// Allowed columns: a JSON array or an object of file name to array.
    #[arg(long)]
    columns: Option<PathBuf>,

    /// Version to export; negative counts back from the latest.
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    version: i64,

    /// standard or load_csv (default from config).
    #[arg(short, long)]
    strategy: Option<String>,

    /// History file to read first and save back after appending.
    #[arg(long)]
    history: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = RunwayConfig::load(&cli.config)?;

    match cli.command {
        Command::Validate { model, columns } => run_validate(&model, &columns),
        Command::Constraints(args) => run_export(Export::Constraints, args, &config),
        Command::Script(args) => run_export(Export::Script, args, &config),
        Command::LoaderConfig(args) => run_export(Export::LoaderConfig, args, &config),
        Command::Document(args) => run_export(Export::Document, args, &config),
        Command::Diagram(args) => run_export(Export::Diagram, args, &config),
        Command::Refine {
            drafts,
            columns,
            max_retries,
            history,
        } => {
            let history_path = history.or_else(|| config.history_path.clone());
            run_refine(
                drafts,
                &columns,
                max_retries.unwrap_or(config.max_retries),
                history_path.as_deref(),
            )
        }
    }
}

fn run_validate(model: &Path, columns: &Path) -> anyhow::Result<()> {
    let model = read_model(model)?;
    let columns = read_columns(columns)?;

    let violations = validate(&model, &columns);
    for violation in &violations {
        println!("{violation}");
    }
    if !violations.is_empty() {
        anyhow::bail!("{} schema violation(s)", violations.len());
    }
    tracing::info!(
        nodes = model.nodes().len(),
        relationships = model.relationships().len(),
        "Model is valid"
    );
    Ok(())
}

fn run_export(export: Export, args: ExportArgs, config: &RunwayConfig) -> anyhow::Result<()> {
    let strategy = match &args.strategy {
        Some(name) => name.parse::<IngestionStrategy>()?,
        None => config.strategy,
    };
    let columns = args.columns.as_deref().map(read_columns).transpose()?;
    let history_path = args.history.or_else(|| config.history_path.clone());

    let mut history = open_history(history_path.as_deref())?;
    let appended = append_models(&mut history, &args.models, columns.as_ref());
    if let Err(CliError::Rejected { violations, .. }) = &appended {
        for violation in violations {
            eprintln!("{violation}");
        }
    }
    appended?;

    if !args.models.is_empty() {
        save_history(&history, history_path.as_deref())?;
    }

    print!("{}", render(export, &history, args.version, strategy, config)?);
    Ok(())
}

fn run_refine(
    drafts: Vec<PathBuf>,
    columns: &Path,
    max_retries: usize,
    history_path: Option<&Path>,
) -> anyhow::Result<()> {
    let columns = read_columns(columns)?;
    let mut history = open_history(history_path)?;

    let (outcome, log) = refine_drafts(drafts, columns, max_retries, &mut history);
    tracing::debug!(session = %log.id, transitions = log.transitions.len(), "Refinement finished");
    let accepted = outcome.map_err(CliError::from)?;

    save_history(&history, history_path)?;
    println!(
        "Accepted as version {} after {} correction(s) (session {})",
        accepted.version, accepted.corrections, accepted.session
    );
    Ok(())
}

fn save_history(history: &ModelHistory, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        history.save_json(path)?;
        tracing::info!(path = %path.display(), versions = history.len(), "History saved");
    }
    Ok(())
}
