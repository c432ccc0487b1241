mod cmd;
mod output;
mod root;

use catalog_core::types::{Complexity, ExperienceLevel, SortField, SortOrder};
use clap::{Args, Parser, Subcommand};
use cmd::{cache::CacheSubcommand, config::ConfigSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "subagents",
    about = "Ingest, validate and serve a catalog of agent definitions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from subagents.yaml or .git/)
    #[arg(long, global = true, env = "SUBAGENTS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by `list`.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Category id or directory (e.g. core-development, 01-core-development)
    #[arg(long)]
    pub category: Option<String>,

    /// Technology names; matches any (repeat or comma separate)
    #[arg(long = "tech", value_delimiter = ',')]
    pub technologies: Vec<String>,

    /// junior, intermediate, senior or expert
    #[arg(long)]
    pub level: Option<ExperienceLevel>,

    /// simple, moderate, complex or advanced
    #[arg(long)]
    pub complexity: Option<Complexity>,

    /// Case-insensitive text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// name, category, experience, complexity or updated
    #[arg(long, default_value = "name")]
    pub sort: SortField,

    /// asc or desc
    #[arg(long, default_value = "asc")]
    pub order: SortOrder,

    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate definitions without touching the cache
    Validate {
        /// Directory to scan (default: the configured source_dir)
        path: Option<PathBuf>,
    },

    /// Rebuild the index and every cached summary
    Build {
        /// Source revision to record on the index
        #[arg(long)]
        commit: Option<String>,
    },

    /// List subagents from the index
    List(ListArgs),

    /// Show one subagent
    Show {
        id: String,

        /// Print the raw markdown instead of the record
        #[arg(long)]
        content: bool,
    },

    /// Categories with subagent counts
    Categories,

    /// Technologies by usage
    Technologies,

    /// Inspect and maintain the cache
    Cache {
        #[command(subcommand)]
        subcommand: CacheSubcommand,
    },

    /// Show or validate subagents.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "3200")]
        port: u16,

        /// Rebuild the index before listening even when it is fresh
        #[arg(long)]
        refresh: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Validate { path } => cmd::validate::run(&root, path.as_deref(), cli.json),
        Commands::Build { commit } => cmd::build::run(&root, commit, cli.json),
        Commands::List(args) => cmd::list::run(&root, args, cli.json),
        Commands::Show { id, content } => cmd::show::run(&root, &id, content, cli.json),
        Commands::Categories => cmd::summary::categories(&root, cli.json),
        Commands::Technologies => cmd::summary::technologies(&root, cli.json),
        Commands::Cache { subcommand } => cmd::cache::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port, refresh } => cmd::serve::run(&root, port, refresh),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
