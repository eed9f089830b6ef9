//! Assetgraph CLI - Map the style sheets and scripts every page of a project pulls in

mod commands;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "assetgraph")]
#[command(version)]
#[command(about = "Project resource graph - which pages pull in which style sheets and scripts")]
#[command(long_about = r#"
Assetgraph scans the markup files of a project and follows every
<link rel="stylesheet">, <script src>, @import and require() until no new
file turns up, enabling:
  • Dependency listings for any page, style sheet or script
  • Impact analysis before editing a shared file
  • Detection of references to missing files

Example usage:
  assetgraph build --root ./site
  assetgraph dependents --file site/css/base.css
  assetgraph stale --json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file (default: ./assetgraph.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root (overrides the config file)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project graph and print a summary
    Build {
        /// Include every node in JSON output
        #[arg(long)]
        graph: bool,
    },

    /// List everything a file pulls in, directly or transitively
    Deps {
        /// File to start from
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of edges to follow
        #[arg(long, default_value = "3")]
        depth: usize,
    },

    /// Analyze impact of changes to a file
    Dependents {
        /// File to start from
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of edges to follow
        #[arg(long, default_value = "3")]
        depth: usize,
    },

    /// List referenced files that could not be read
    Stale,

    /// Rebuild whenever a project file changes
    Watch {
        /// Quiet period before a batch of changes triggers a rebuild
        #[arg(long, default_value = "250")]
        debounce_ms: u64,
    },

    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    command: &'a str,
    data: T,
}

/// Print a JSON success envelope; a no-op in human mode
pub fn emit_success<T: Serialize>(output_mode: OutputMode, command: &str, data: T) -> anyhow::Result<()> {
    if output_mode.is_human() {
        return Ok(());
    }
    let envelope = Envelope {
        ok: true,
        command,
        data,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let options = commands::GlobalOptions {
        config: cli.config,
        root: cli.root,
        output_mode,
    };

    match cli.command {
        Commands::Build { graph } => commands::run_build(&options, graph).await,
        Commands::Deps { file, depth } => {
            commands::run_walk(&options, &file, depth, commands::Direction::Dependencies).await
        }
        Commands::Dependents { file, depth } => {
            commands::run_walk(&options, &file, depth, commands::Direction::Dependents).await
        }
        Commands::Stale => commands::run_stale(&options).await,
        Commands::Watch { debounce_ms } => commands::run_watch(&options, debounce_ms).await,
        Commands::Init { force } => commands::run_init(&options, force),
    }
}
