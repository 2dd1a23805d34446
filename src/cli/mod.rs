use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::LedgerService;
use crate::bot::Dispatcher;
use crate::io::Exporter;
use crate::storage::{LoadOutcome, DEFAULT_DB_FILE};

/// Fingo - chat-driven personal finance ledger
#[derive(Parser)]
#[command(name = "fingo")]
#[command(about = "Record income and expenses with chat commands, backed by one JSON file")]
#[command(version)]
pub struct Cli {
    /// Ledger file path
    #[arg(short, long, env = "DB_FILE", default_value = DEFAULT_DB_FILE)]
    pub database: PathBuf,

    /// User id the messages are sent as
    #[arg(short, long, env = "FINGO_USER", default_value = "local", global = true)]
    pub user: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger file, or recover it if it is corrupt
    Init,

    /// Send a single chat message, e.g. `fingo send /masuk 50000 gajian`
    Send {
        /// The message text
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },

    /// Read chat messages from stdin, one per line, and print each reply
    Chat,

    /// Export the user's entries
    Export {
        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Install the global tracing subscriber. Logs go to stderr so replies on
/// stdout stay clean. `RUST_LOG` overrides the default level.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "fingo=debug" } else { "fingo=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let service = LedgerService::open(&self.database);

        match self.command {
            Commands::Init => {
                let outcome = service.init()?;
                match outcome {
                    LoadOutcome::Fresh => {
                        println!("Ledger file created: {}", self.database.display())
                    }
                    LoadOutcome::Loaded => {
                        println!("Ledger file is valid: {}", self.database.display())
                    }
                    LoadOutcome::Repaired(set_aside) => println!(
                        "Ledger file loaded with {} user(s) and {} entry(ies) set aside: {}",
                        set_aside.users,
                        set_aside.entries,
                        self.database.display()
                    ),
                    LoadOutcome::Recovered { backup } => println!(
                        "Ledger file was corrupt and has been reset: {} (backup: {})",
                        self.database.display(),
                        backup.display()
                    ),
                }
            }

            Commands::Send { message } => {
                let mut dispatcher = Dispatcher::new(service);
                let reply = dispatcher.handle_message(&self.user, &message.join(" "))?;
                println!("{}", reply);
            }

            Commands::Chat => {
                let dispatcher = Dispatcher::new(service);
                run_chat(dispatcher, &self.user)?;
            }

            Commands::Export { format, output } => {
                run_export_command(&service, &self.user, &format, output)?;
            }
        }

        Ok(())
    }
}

fn run_chat(mut dispatcher: Dispatcher, user_id: &str) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        // A failed command must not end the session
        let reply = match dispatcher.handle_message(user_id, &line) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(user = user_id, error = %e, "Command failed");
                "⚠️ Terjadi kesalahan, coba lagi nanti.".to_string()
            }
        };

        writeln!(stdout, "{}\n", reply)?;
        stdout.flush()?;
    }

    Ok(())
}

fn run_export_command(
    service: &LedgerService,
    user_id: &str,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let exporter = Exporter::new(service);

    match format.to_lowercase().as_str() {
        "csv" => {
            let count = exporter.export_entries_csv(user_id, writer)?;
            if output.is_some() {
                eprintln!("Exported {} entries", count);
            }
        }
        "json" => {
            let snapshot = exporter.export_ledger_json(user_id, writer)?;
            if output.is_some() {
                eprintln!("Exported {} entries", snapshot.entries.len());
            }
        }
        other => anyhow::bail!("Unknown export format '{}'. Use csv or json", other),
    }

    Ok(())
}
