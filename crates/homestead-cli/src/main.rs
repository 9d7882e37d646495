//! Homestead CLI
//!
//! Command-line interface for Homestead - export, import and inspect farm records.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use homestead_core::{
    Config, ConflictStrategy, ExportFormat, Scope, StorageError, Store, TransferError,
};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "homestead")]
#[command(about = "Homestead - Local-first farm records with portable exports")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scope as JSON or CSV
    Export {
        /// Scope to export (full, garden, livestock, tasks, finances, orchard, apiary, inventory)
        #[arg(short, long, default_value = "full")]
        scope: Scope,
        /// Output format (json or csv)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        /// Directory to write the file into (defaults to <data_dir>/exports)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// User id recorded in the bundle and history
        #[arg(long)]
        user: Option<String>,
    },
    /// Import a JSON bundle
    Import {
        /// File to import
        file: PathBuf,
        /// How to treat records whose id already exists (skip, overwrite, copy)
        #[arg(short, long)]
        strategy: Option<ConflictStrategy>,
        /// User id recorded in the history
        #[arg(long)]
        user: Option<String>,
    },
    /// Show export or import history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// List scopes and their collections
    Scopes,
    /// Describe the import conflict strategies
    Strategies,
    /// Inspect and edit raw records
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show data directory, database size and record counts
    Status,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Past exports, newest first
    Exports {
        /// Only entries for this user
        #[arg(long)]
        user: Option<String>,
    },
    /// Past imports, newest first
    Imports {
        /// Only entries for this user
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// Insert or replace a record from a JSON object
    Put {
        collection: String,
        /// Record as JSON, must contain a string "id"
        json: String,
    },
    /// Show one record
    Get { collection: String, id: String },
    /// List records in a collection
    #[command(alias = "ls")]
    List {
        collection: String,
        /// Only records where FIELD equals VALUE
        #[arg(long = "where", value_name = "FIELD=VALUE")]
        filter: Option<String>,
    },
    /// Delete a record
    #[command(alias = "rm")]
    Delete { collection: String, id: String },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, user_id, default_strategy, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    if let Err(e) = run(cli, &output).await {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = recovery_hint(&e) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    // Commands that don't need the store
    match &cli.command {
        Commands::Config { command } => {
            return handle_config_command(command.clone(), cli.config.as_ref(), output);
        }
        Commands::Scopes => return commands::scopes::list(output),
        Commands::Strategies => return commands::scopes::strategies(output),
        _ => {}
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let store = Store::open_with_config(config)?;
    debug!("Opened store at {:?}", store.config().sqlite_path());

    match cli.command {
        Commands::Export {
            scope,
            format,
            out,
            user,
        } => commands::export::run(&store, scope, format, out, user, output).await,
        Commands::Import {
            file,
            strategy,
            user,
        } => {
            let succeeded = commands::import::run(&store, &file, strategy, user, output).await?;
            if !succeeded {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::History { command } => handle_history_command(command, &store, output).await,
        Commands::Record { command } => handle_record_command(command, &store, output).await,
        Commands::Status => commands::status::show(&store, output).await,
        Commands::Config { .. } | Commands::Scopes | Commands::Strategies => Ok(()),
    }
}

async fn handle_history_command(
    command: HistoryCommands,
    store: &Store,
    output: &Output,
) -> Result<()> {
    match command {
        HistoryCommands::Exports { user } => {
            commands::history::exports(store, user.as_deref(), output).await
        }
        HistoryCommands::Imports { user } => {
            commands::history::imports(store, user.as_deref(), output).await
        }
    }
}

async fn handle_record_command(
    command: RecordCommands,
    store: &Store,
    output: &Output,
) -> Result<()> {
    match command {
        RecordCommands::Put { collection, json } => {
            commands::record::put(store, &collection, &json, output).await
        }
        RecordCommands::Get { collection, id } => {
            commands::record::get(store, &collection, &id, output).await
        }
        RecordCommands::List { collection, filter } => {
            commands::record::list(store, &collection, filter.as_deref(), output).await
        }
        RecordCommands::Delete { collection, id } => {
            commands::record::delete(store, &collection, &id, output).await
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Recovery suggestion for the first storage error in the cause chain
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if let Some(storage) = cause.downcast_ref::<StorageError>() {
            return storage.recovery_suggestion();
        }
        match cause.downcast_ref::<TransferError>() {
            Some(TransferError::Storage(storage)) => storage.recovery_suggestion(),
            _ => None,
        }
    })
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over `--verbose`. Logs go to `log_file` when configured,
/// otherwise to stderr.
fn init_logging(config: &Config, verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "homestead_core={},homestead_cli={}",
            log_level, log_level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    let Some(log_path) = config.log_file.as_ref() else {
        let _ = builder.with_writer(std::io::stderr).try_init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(log_file) => {
            let _ = builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file))
                .try_init();
        }
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
