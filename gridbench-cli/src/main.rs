//! gridbench CLI: run problem × algorithm batches from the terminal.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// gridbench: fault-isolated batch experiments over registered algorithms
#[derive(Parser, Debug)]
#[command(name = "gridbench", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Component family selected on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Classifier,
    Transform,
    Clusterer,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List registered components
    List {
        /// Only this component family
        #[arg(short, long, value_enum)]
        kind: Option<Kind>,

        /// Filter by tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Require every tag instead of any
        #[arg(long)]
        all_tags: bool,
    },
    /// Run a batch over problems × algorithms
    Run {
        /// Component family to run
        #[arg(short, long, value_enum, default_value = "classifier")]
        kind: Kind,

        /// Problem names (repeatable)
        #[arg(short, long = "problem", required = true)]
        problems: Vec<String>,

        /// Algorithm names (repeatable)
        #[arg(short, long = "algorithm")]
        algorithms: Vec<String>,

        /// Select algorithms by tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Require every tag instead of any
        #[arg(long)]
        all_tags: bool,

        /// Cells in flight at once
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Per-cell timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,

        /// Resample fold to load
        #[arg(long)]
        fold: Option<usize>,

        /// Data root directory
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Report output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not write the report file
        #[arg(long)]
        no_save: bool,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create default configuration file
    Init,
    /// Show current configuration
    Show,
}

/// Grace period for blocking work left behind by timed-out cells.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn build_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

/// Stop the runtime without joining detached blocking tasks. A cell that
/// outlived its timeout must not keep the process alive.
fn shutdown(runtime: Runtime) {
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "gridbench", "gridbench")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "gridbench.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let runtime = build_runtime()?;
    let result = runtime.block_on(commands::handle_command(
        cli.command,
        &workspace,
        cli.config.as_deref(),
    ));
    shutdown(runtime);
    result
}
