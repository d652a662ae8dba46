use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::StoreArgs;

#[derive(Parser)]
#[command(name = "azblob-certstore")]
#[command(about = "Inspect and lock an Azure Blob certificate store", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a YAML configuration file
    #[arg(short, long, global = true, conflicts_with = "url")]
    config: Option<String>,

    /// Store URL (azblob://container@account, azblob://account/container, memory://)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Print Prometheus metrics to stderr when the command finishes
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a value under a key
    Put {
        /// Key to write
        key: String,

        /// Read the value from this file
        #[arg(short, long, conflicts_with = "value")]
        file: Option<String>,

        /// Literal value to store
        #[arg(long)]
        value: Option<String>,
    },

    /// Print the value stored under a key
    Get {
        /// Key to read
        key: String,

        /// Write the value to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete a key
    Delete {
        /// Key to delete
        key: String,
    },

    /// Check whether a key exists (exit code 1 if not)
    Exists {
        /// Key to check
        key: String,
    },

    /// List keys under a prefix
    List {
        /// Prefix to list (empty for the whole container)
        #[arg(default_value = "")]
        prefix: String,

        /// Descend into every level below the prefix
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show metadata for a key
    Stat {
        /// Key to describe
        key: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Acquire the lock guarding a key, hold it for a while, then release it
    Hold {
        /// Lock key
        key: String,

        /// Seconds to hold the lock
        #[arg(short, long, default_value = "30")]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let args = StoreArgs {
        config: cli.config,
        url: cli.url,
        metrics: cli.metrics,
    };
    let store = commands::open(&args)?;

    let result = match cli.command {
        Commands::Put { key, file, value } => {
            commands::put::run(&store, &key, file.as_deref(), value.as_deref()).await
        }
        Commands::Get { key, output } => commands::get::run(&store, &key, output.as_deref()).await,
        Commands::Delete { key } => commands::delete::run(&store, &key).await,
        Commands::Exists { key } => {
            if !commands::exists::run(&store, &key).await {
                store.print_metrics();
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::List { prefix, recursive } => {
            commands::list::run(&store, &prefix, recursive).await
        }
        Commands::Stat { key, format } => commands::stat::run(&store, &key, &format).await,
        Commands::Hold { key, seconds } => commands::lock::hold(&store, &key, seconds).await,
    };

    store.print_metrics();
    result
}
