//! CLI command definitions, routing, and tracing setup.

use std::io::IsTerminal;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use takeaways_core::{
    DocumentLocation, RetryPolicy, Workflow, cleanup_change, generate_takeaways, prepare_update,
    run_task, update_takeaways,
};
use takeaways_github::{GitHubClient, GitHubOptions};
use takeaways_provider::{OpenRouterClient, OpenRouterOptions};
use takeaways_shared::{
    AppConfig, FieldSelection, ProgressSink, TaskStatus, TracingProgress, github_token,
    init_config, load_config, provider_api_key, validate_credentials,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// takeaways: regenerate glossary takeaways and open pull requests.
#[derive(Parser)]
#[command(
    name = "takeaways",
    version,
    about = "Regenerate selected glossary takeaways and publish them as pull requests.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
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
    /// Generate takeaways for a term and print them as JSON.
    Generate {
        /// Glossary term, e.g. "MIME types".
        term: String,

        /// Field selection as JSON, e.g. '{"tldr": true, "bestPractices": [0]}'.
        #[arg(long)]
        fields: Option<String>,
    },

    /// Regenerate takeaways, patch the glossary document and open a pull request.
    Update {
        /// Glossary term, e.g. "MIME types".
        term: String,

        /// Field selection as JSON. Defaults to every field.
        #[arg(long)]
        fields: Option<String>,

        /// Print the patched document instead of publishing it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Close a pull request opened by `update` and delete its branch.
    Cleanup {
        /// Pull-request number.
        #[arg(long)]
        pr: u64,

        /// Branch the pull request was opened from.
        #[arg(long)]
        branch: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
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
        0 => "takeaways=info",
        1 => "takeaways=debug",
        _ => "takeaways=trace",
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
    match cli.command {
        Command::Generate { term, fields } => cmd_generate(&term, fields.as_deref()).await,
        Command::Update {
            term,
            fields,
            dry_run,
        } => cmd_update(&term, fields.as_deref(), dry_run).await,
        Command::Cleanup { pr, branch } => cmd_cleanup(pr, &branch).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Parse a `--fields` argument.
fn parse_fields(raw: Option<&str>) -> Result<Option<FieldSelection>> {
    raw.map(|json| {
        serde_json::from_str(json).map_err(|e| eyre!("invalid --fields JSON '{json}': {e}"))
    })
    .transpose()
}

fn provider(config: &AppConfig) -> Result<OpenRouterClient> {
    let key = provider_api_key(config)?;
    Ok(OpenRouterClient::new(OpenRouterOptions::from_config(
        &config.provider,
        key,
    ))?)
}

fn github(config: &AppConfig) -> Result<GitHubClient> {
    let token = github_token(config)?;
    Ok(GitHubClient::new(GitHubOptions::from_config(
        &config.github,
        token,
    ))?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(term: &str, fields: Option<&str>) -> Result<()> {
    let fields = parse_fields(fields)?;
    let config = load_config()?;
    let generator = provider(&config)?;

    info!(term, "generating takeaways");

    let progress = progress_sink("Generating takeaways", std::io::stderr().is_terminal());
    let progress = progress.as_ref();
    let policy = RetryPolicy::from(&config.retry);
    let generated = run_task("generate-takeaways", policy, progress, |_| {
        generate_takeaways(term, fields.as_ref(), &generator, progress)
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&generated)?);
    Ok(())
}

async fn cmd_update(term: &str, fields: Option<&str>, dry_run: bool) -> Result<()> {
    let fields = parse_fields(fields)?;
    let config = load_config()?;
    validate_credentials(&config)?;

    let generator = provider(&config)?;
    let vcs = github(&config)?;
    let location = DocumentLocation::from_config(&config);
    let progress = progress_sink("Updating takeaways", std::io::stderr().is_terminal());
    let progress = progress.as_ref();
    let workflow = Workflow {
        generator: &generator,
        vcs: &vcs,
        progress,
        location: &location,
    };
    let policy = RetryPolicy::from(&config.retry);

    info!(term, dry_run, "updating takeaways");

    if dry_run {
        let patched = run_task("preview-takeaways", policy, progress, |_| {
            prepare_update(&workflow, term, fields.as_ref())
        })
        .await?;

        println!();
        println!("  Dry run: nothing was published.");
        println!("  Path:    {}", patched.path);
        println!("  Version: {}", patched.version);
        println!("  Fields:  {}", patched.updated_fields.join(", "));
        println!();
        println!("{}", patched.content);
        return Ok(());
    }

    let outcome = run_task("update-takeaways", policy, progress, |_| {
        update_takeaways(&workflow, term, fields.as_ref())
    })
    .await?;

    println!();
    match (&outcome.pull_request, &outcome.branch) {
        (Some(pull_request), Some(branch)) => {
            println!("  Pull request opened!");
            println!("  Term:   {}", outcome.term);
            println!("  Fields: {}", outcome.updated_fields.join(", "));
            println!("  Branch: {branch}");
            println!("  PR:     #{} {}", pull_request.number, pull_request.url);
        }
        _ => {
            println!("  No fields changed; nothing was published.");
            println!("  Term:   {}", outcome.term);
            println!("  Path:   {}", outcome.path);
        }
    }
    println!();

    Ok(())
}

async fn cmd_cleanup(pr: u64, branch: &str) -> Result<()> {
    let config = load_config()?;
    let vcs = github(&config)?;

    info!(pr, branch, "cleaning up pull request");

    let report = cleanup_change(&vcs, pr, branch).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_clean() {
        return Err(eyre!("cleanup of #{pr} ({branch}) was incomplete"));
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

// ---------------------------------------------------------------------------
// CLI progress sink
// ---------------------------------------------------------------------------

/// Bar on an interactive stderr, log lines otherwise.
fn progress_sink(label: &'static str, interactive: bool) -> Box<dyn ProgressSink> {
    if interactive {
        Box::new(CliProgress::new(label))
    } else {
        Box::new(TracingProgress)
    }
}

/// Progress sink drawing an indicatif bar on stderr.
struct CliProgress {
    bar: ProgressBar,
    label: &'static str,
}

impl CliProgress {
    fn new(label: &'static str) -> Self {
        let bar = ProgressBar::new(100);
        let style =
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .progress_chars("=> ");
        bar.set_style(style);
        bar.set_message(label);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar, label }
    }
}

impl ProgressSink for CliProgress {
    fn set_progress(&self, fraction: f64) {
        self.bar.set_position((fraction.clamp(0.0, 1.0) * 100.0).round() as u64);
    }

    fn set_status(&self, status: TaskStatus) {
        match status {
            TaskStatus::Running => self.bar.set_message(self.label),
            TaskStatus::Retrying => self.bar.set_message(format!("{} (retrying)", self.label)),
            TaskStatus::Completed | TaskStatus::Failed => self.bar.finish_and_clear(),
        }
    }

    fn record_error(&self, message: &str) {
        self.bar.println(format!("  error: {message}"));
    }

    fn record_metric(&self, name: &str, value: f64) {
        debug!(metric = name, value, "metric");
    }
}
