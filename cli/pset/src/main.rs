//! pset CLI: parse, materialize and query pset configuration documents.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::get::ValueType;
use config::PsetConfig;

#[derive(Parser)]
#[command(name = "pset", version, about = "Parameter-set configuration tool")]
struct Cli {
    /// Configuration file (default: nearest pset.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and print the materialized parameter set
    Parse {
        /// Source file
        file: PathBuf,
        /// Print JSON instead of canonical text
        #[arg(long)]
        json: bool,
    },
    /// Look up one value by dotted/indexed path
    Get {
        /// Source file
        file: PathBuf,
        /// Path such as `a.b[2].c`
        path: String,
        /// Decode the value as this type
        #[arg(long = "type", value_enum)]
        ty: Option<ValueType>,
    },
    /// List top-level keys
    Keys {
        /// Source file
        file: PathBuf,
        /// Only keys whose values are tables
        #[arg(long)]
        psets: bool,
    },
    /// Print the content identifier of the document or a nested table
    Id {
        /// Source file
        file: PathBuf,
        /// Path to a nested table
        path: Option<String>,
    },
    /// Parse only and report unresolved references
    Check {
        /// Source file
        file: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = PsetConfig::resolve(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Parse { file, json } => commands::parse::run(&config, &file, json),
        Commands::Get { file, path, ty } => commands::get::run(&config, &file, &path, ty),
        Commands::Keys { file, psets } => commands::keys::run(&config, &file, psets),
        Commands::Id { file, path } => commands::id::run(&config, &file, path.as_deref()),
        Commands::Check { file } => commands::check::run(&config, &file),
    }
}
