use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tl")]
#[command(about = "Tasklines - status changes and recurrence for markdown task lines")]
#[command(version)]
struct Cli {
    /// Path to the tasklines config directory (default: .tasklines in current dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Output as JSON for machine consumption
    #[arg(long, global = true)]
    json: bool,

    /// Log debug details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config file
    Init {
        /// Also add a theme's statuses (its, minimal)
        #[arg(long)]
        preset: Option<String>,
    },

    /// Toggle the task on a line to its next status
    Toggle {
        /// Markdown file
        file: PathBuf,

        /// Line number (1-based)
        line: usize,

        /// Completion date (YYYY-MM-DD) for done/cancelled dates and "when done" rules
        #[arg(long)]
        date: Option<String>,
    },

    /// Move the task on a line to the status with the given symbol
    SetStatus {
        /// Markdown file
        file: PathBuf,

        /// Line number (1-based)
        line: usize,

        /// Status symbol, e.g. "x" or "-"
        symbol: String,

        /// Completion date (YYYY-MM-DD) for done/cancelled dates and "when done" rules
        #[arg(long)]
        date: Option<String>,
    },

    /// Show the loaded statuses as a mermaid diagram
    Statuses {
        /// Include symbols and types in each node
        #[arg(long)]
        details: bool,
    },

    /// Print the markdown status report
    Report,

    /// Find status symbols in markdown files that are not configured
    Unknown {
        /// File or directory to scan
        path: PathBuf,

        /// Append the unknown statuses to the custom statuses in the config
        #[arg(long)]
        add: bool,
    },

    /// Check status settings, and dependencies of tasks under a path
    Check {
        /// File or directory to scan for task dependencies
        path: Option<PathBuf>,
    },

    /// Find tasks that the task on a line could depend on
    Candidates {
        /// Markdown file
        file: PathBuf,

        /// Line number (1-based)
        line: usize,

        /// Text to look for in task descriptions
        search: String,

        /// Directory to search (default: the file's directory)
        #[arg(long)]
        within: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "tasklines=debug" } else { "tasklines=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let tasklines_dir = cli.dir.unwrap_or_else(|| PathBuf::from(".tasklines"));

    match cli.command {
        Commands::Init { preset } => {
            let preset = preset
                .map(|p| p.parse().map_err(|e: String| anyhow::anyhow!(e)))
                .transpose()?;
            commands::init::run(&tasklines_dir, preset)
        }
        Commands::Toggle { file, line, date } => {
            commands::toggle::run(&tasklines_dir, &file, line, date.as_deref(), cli.json)
        }
        Commands::SetStatus {
            file,
            line,
            symbol,
            date,
        } => commands::set_status::run(
            &tasklines_dir,
            &file,
            line,
            &symbol,
            date.as_deref(),
            cli.json,
        ),
        Commands::Statuses { details } => commands::statuses::run(&tasklines_dir, details, cli.json),
        Commands::Report => commands::report::run(&tasklines_dir),
        Commands::Unknown { path, add } => commands::unknown::run(&tasklines_dir, &path, add, cli.json),
        Commands::Check { path } => commands::check::run(&tasklines_dir, path.as_deref(), cli.json),
        Commands::Candidates {
            file,
            line,
            search,
            within,
        } => commands::candidates::run(
            &tasklines_dir,
            &file,
            line,
            &search,
            within.as_deref(),
            cli.json,
        ),
    }
}
