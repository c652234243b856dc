//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use scorecard_core::{AnalysisOrchestrator, FilePreferences};
use scorecard_shared::{
    AnalysisId, AppConfig, QualificationAnalysis, ScorecardError, init_config, load_config,
};
use scorecard_storage::{SavedAnalysis, Storage};

use crate::render;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Scorecard — MEDDPICC qualification from sales meeting notes.
#[derive(Parser)]
#[command(
    name = "scorecard",
    version,
    about = "Score sales meeting notes against MEDDPICC and draft the follow-up.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Analyze meeting notes.
    Analyze {
        /// Notes text. Reads FILE, or stdin, when omitted.
        #[arg(short, long, conflicts_with = "file")]
        notes: Option<String>,

        /// Read notes from a file.
        file: Option<PathBuf>,

        /// Store the analysis in the local database.
        #[arg(long)]
        save: bool,

        /// Meeting title to store with the analysis.
        #[arg(long, requires = "save")]
        title: Option<String>,
    },

    /// Show a stored analysis.
    Show {
        /// Analysis ID.
        id: String,
    },

    /// List stored analyses for the configured user.
    List,

    /// Demo/live mode.
    Mode {
        #[command(subcommand)]
        action: ModeAction,
    },

    /// Forget the current result and the remembered notes.
    Clear,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Mode subcommands.
#[derive(Subcommand)]
pub(crate) enum ModeAction {
    /// Print the current mode.
    Show,
    /// Switch between demo and live; entering demo re-runs the last notes.
    Toggle,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "scorecard=info",
        1 => "scorecard=debug",
        _ => "scorecard=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Command::Analyze {
            notes,
            file,
            save,
            title,
        } => cmd_analyze(notes, file, save, title.as_deref(), json).await,
        Command::Show { id } => cmd_show(&id, json).await,
        Command::List => cmd_list(json).await,
        Command::Mode { action } => match action {
            ModeAction::Show => cmd_mode_show(json).await,
            ModeAction::Toggle => cmd_mode_toggle(json).await,
        },
        Command::Clear => cmd_clear().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput<'a> {
    analysis: &'a QualificationAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<&'a SavedAnalysis>,
}

async fn cmd_analyze(
    notes: Option<String>,
    file: Option<PathBuf>,
    save: bool,
    title: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config()?;
    let notes = read_notes(notes, file)?;
    let orchestrator = open_orchestrator(&config)?;

    let demo_mode = orchestrator.demo_mode();
    info!(demo_mode, save, "analyzing meeting notes");

    let spinner = Spinner::start(if demo_mode {
        "Analyzing (demo mode)..."
    } else {
        "Analyzing meeting notes..."
    })?;
    let outcome = orchestrator.analyze(&notes).await;
    spinner.finish();
    let analysis = outcome.map_err(user_facing)?;

    let saved = if save {
        let storage = open_storage(&config).await?;
        let saved = storage
            .save_analysis(&config.identity.user_id, &notes, &analysis, title)
            .await
            .map_err(user_facing)?;
        Some(saved)
    } else {
        None
    };

    if json {
        print_json(&AnalyzeOutput {
            analysis: &analysis,
            saved: saved.as_ref(),
        })?;
    } else {
        render::print_analysis(&analysis);
        if let Some(saved) = &saved {
            println!("  Saved as analysis {}", saved.analysis_id);
            println!();
        }
    }
    Ok(())
}

async fn cmd_show(id: &str, json: bool) -> Result<()> {
    let analysis_id: AnalysisId = id
        .parse()
        .map_err(|e| eyre!("invalid analysis id '{id}': {e}"))?;

    let config = load_config()?;
    let storage = open_storage(&config).await?;
    let loaded = storage
        .load_analysis(&analysis_id)
        .await
        .map_err(user_facing)?;

    if json {
        print_json(&loaded)?;
    } else {
        render::print_loaded(&loaded);
    }
    Ok(())
}

async fn cmd_list(json: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;
    let summaries = storage
        .list_analyses(&config.identity.user_id)
        .await
        .map_err(user_facing)?;

    if json {
        print_json(&summaries)?;
    } else {
        render::print_list(&summaries);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModeOutput {
    demo_mode: bool,
}

async fn cmd_mode_show(json: bool) -> Result<()> {
    let config = load_config()?;
    let demo_mode = open_orchestrator(&config)?.demo_mode();
    if json {
        print_json(&ModeOutput { demo_mode })?;
    } else {
        println!("{}", render::mode_label(demo_mode));
    }
    Ok(())
}

async fn cmd_mode_toggle(json: bool) -> Result<()> {
    let config = load_config()?;
    let orchestrator = open_orchestrator(&config)?;

    let spinner = Spinner::start("Switching mode...")?;
    let outcome = orchestrator.toggle_mode().await;
    spinner.finish();
    let outcome = outcome.map_err(user_facing)?;

    if json {
        print_json(&outcome)?;
        return Ok(());
    }

    println!("Switched to {}", render::mode_label(outcome.demo_mode));
    if let Some(analysis) = &outcome.replayed {
        render::print_analysis(analysis);
    }
    Ok(())
}

async fn cmd_clear() -> Result<()> {
    let config = load_config()?;
    open_orchestrator(&config)?
        .clear()
        .await
        .map_err(user_facing)?;
    println!("Cleared.");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_orchestrator(config: &AppConfig) -> Result<AnalysisOrchestrator> {
    let preferences = Arc::new(FilePreferences::default_location()?);
    Ok(AnalysisOrchestrator::from_config(config, preferences)?)
}

async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let path = config.storage.resolved_path()?;
    Ok(Storage::open(&path).await?)
}

/// Notes from `--notes`, a file, or stdin, in that order.
fn read_notes(notes: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(notes) = notes {
        return Ok(notes);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path).map_err(|e| ScorecardError::io(&path, e).into());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| eyre!("failed to read notes from stdin: {e}"))?;
    Ok(buf)
}

/// Lead with the user-safe message; keep the diagnostic as the cause.
fn user_facing(err: ScorecardError) -> Report {
    let message = err.user_message();
    Report::new(err).wrap_err(message)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Stderr spinner shown while a request is in flight.
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn start(message: &'static str) -> Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(message);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { bar })
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}
