//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use founderfuel_core::{ProgressReporter, ScrapePipeline, Services, Stage, open_storage};
use founderfuel_crawler::PageFetcher;
use founderfuel_shared::{
    AppConfig, CritiqueResult, ExtractionRecord, FounderFuelError, RepurposeResult, init_config,
    load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// FounderFuel: critique landing pages and repurpose blog posts with an LLM.
#[derive(Parser)]
#[command(
    name = "founderfuel",
    version,
    about = "Score landing pages and turn blog posts into social copy.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Fetch a page and store its extracted content.
    Scrape {
        /// Page URL (http or https).
        url: String,

        /// Print the stored record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Score a landing page's headline, value proposition, CTA, and trust signals.
    Analyze {
        /// Landing page URL (http or https).
        url: String,

        /// Print the stored record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Turn a blog post into a Twitter thread, LinkedIn post, and newsletter blurb.
    Repurpose {
        /// Blog post URL (http or https).
        url: String,

        /// Print the stored record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show stored results, newest first.
    History {
        /// Which records to list.
        kind: HistoryKind,

        /// Maximum number of records (1-100).
        #[arg(short, long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,

        /// Print records as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Record kinds available to `history`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum HistoryKind {
    Extractions,
    Analyses,
    Repurposes,
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

/// Initialize tracing based on CLI flags. Logs go to stderr so `--json`
/// output on stdout stays machine-readable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "founderfuel=info",
        1 => "founderfuel=debug",
        _ => "founderfuel=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
    match cli.command {
        Command::Scrape { url, json } => cmd_scrape(&url, json).await,
        Command::Analyze { url, json } => cmd_analyze(&url, json).await,
        Command::Repurpose { url, json } => cmd_repurpose(&url, json).await,
        Command::History { kind, limit, json } => cmd_history(kind, limit, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(url: &str, json: bool) -> Result<()> {
    // No model involved, so no API key required.
    let config = load_config()?;
    let fetcher = PageFetcher::new(&config.fetch)?;
    let storage = open_storage(&config).await?;
    let pipeline = ScrapePipeline::new(Arc::new(fetcher), Arc::new(storage));

    let progress = CliProgress::new();
    let record = pipeline.run(url, &progress).await?;

    if json {
        print_json(&record)?;
    } else {
        print_extraction(&record);
    }
    Ok(())
}

async fn cmd_analyze(url: &str, json: bool) -> Result<()> {
    let services = services().await?;

    let progress = CliProgress::new();
    let result = services.analysis.run(url, &progress).await?;

    if json {
        print_json(&result)?;
    } else {
        print_critique(&result);
    }
    Ok(())
}

async fn cmd_repurpose(url: &str, json: bool) -> Result<()> {
    let services = services().await?;

    let progress = CliProgress::new();
    let result = services.repurpose.run(url, &progress).await?;

    if json {
        print_json(&result)?;
    } else {
        print_repurpose(&result);
    }
    Ok(())
}

async fn cmd_history(kind: HistoryKind, limit: u32, json: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    match kind {
        HistoryKind::Extractions => {
            let records = storage.list_extractions(limit).await?;
            if json {
                return print_json(&records);
            }
            print_empty_notice(records.is_empty());
            for r in &records {
                println!("{}  {}  {}", r.scraped_at.format("%Y-%m-%d %H:%M"), r.url, r.title);
            }
        }
        HistoryKind::Analyses => {
            let records = storage.list_critiques(limit).await?;
            if json {
                return print_json(&records);
            }
            print_empty_notice(records.is_empty());
            for r in &records {
                println!(
                    "{}  {:>2}/10  {}",
                    r.analyzed_at.format("%Y-%m-%d %H:%M"),
                    r.overall_score,
                    r.url
                );
            }
        }
        HistoryKind::Repurposes => {
            let records = storage.list_repurposes(limit).await?;
            if json {
                return print_json(&records);
            }
            print_empty_notice(records.is_empty());
            for r in &records {
                println!("{}  {}  {}", r.created_at.format("%Y-%m-%d %H:%M"), r.url, r.title);
            }
        }
    }
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

/// Load config and build every pipeline (requires the OpenRouter key).
async fn services() -> Result<Services> {
    let config = load_config()?;
    Ok(Services::from_config(&config).await?)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_empty_notice(empty: bool) {
    if empty {
        println!("No records yet.");
    }
}

fn print_extraction(r: &ExtractionRecord) {
    println!("{}", r.title);
    println!("{}", r.url);
    println!();
    println!("{}", r.description);
    println!();
    println!("{}", preview(&r.body_text, 400));
    println!();
    println!("Saved as {} ({} characters of body text)", r.id, r.body_text.chars().count());
}

fn print_critique(r: &CritiqueResult) {
    println!("Landing page critique: {}", r.url);
    println!();
    println!("  Headline        {:>2}/10", r.headline_score);
    println!("  Value prop      {:>2}/10", r.value_score);
    println!("  Call to action  {:>2}/10", r.cta_score);
    println!("  Trust           {:>2}/10", r.trust_score);
    println!("  Overall         {:>2}/10", r.overall_score);
    println!();
    println!("{}", r.feedback);
    println!();
    println!("Saved as {}", r.id);
}

fn print_repurpose(r: &RepurposeResult) {
    println!("Repurposed: {} ({})", r.title, r.url);
    for (heading, body) in [
        ("Twitter / X thread", &r.twitter_thread),
        ("LinkedIn post", &r.linkedin_post),
        ("Newsletter", &r.newsletter),
    ] {
        println!();
        println!("== {heading} ==");
        println!("{body}");
    }
    println!();
    println!("Saved as {}", r.id);
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, stage: Stage) {
        self.spinner.set_message(format!("{stage}..."));
    }

    fn failed(&self, stage: Stage, _error: &FounderFuelError) {
        self.spinner.abandon_with_message(format!("Failed while: {}", stage.label().to_lowercase()));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
