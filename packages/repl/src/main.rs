use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dotstore::{Database, StoreConfig};
use dotstore_repl::{commands, EditMode};

const LOG_ENV: &str = "DOTSTORE_LOG";

/// dotstore - dot-path key/value store with document collections
#[derive(Parser, Debug)]
#[command(name = "dotstore")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snapshot file (overrides DOTSTORE_FILE)
    #[arg(short, long, conflicts_with = "memory")]
    file: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long)]
    memory: bool,

    /// Force vi editing mode
    #[arg(long, conflicts_with = "emacs")]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,

    /// Run this command and exit instead of starting the shell
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl Args {
    fn config(&self) -> StoreConfig {
        let config = StoreConfig::from_env();
        if self.memory {
            config.in_memory()
        } else if let Some(file) = &self.file {
            config.with_file(file)
        } else {
            config
        }
    }

    fn edit_mode(&self) -> EditMode {
        if self.vi {
            EditMode::Vi
        } else if self.emacs {
            EditMode::Emacs
        } else {
            EditMode::Detect
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Write any changes a failed save left behind.
fn finish(db: Database) -> Result<(), dotstore::Error> {
    if db.store_ref().is_dirty() {
        db.close()
    } else {
        Ok(())
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let mut db = Database::open(args.config());

    if !args.command.is_empty() {
        let line = args.command.join(" ");
        let outcome = commands::execute_once(&line, &mut db);
        let closed = finish(db);
        return match (outcome, closed) {
            (Ok(output), Ok(())) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
                ExitCode::SUCCESS
            }
            (Err(error), _) => {
                eprintln!("Error: {}", error);
                ExitCode::FAILURE
            }
            (Ok(_), Err(error)) => {
                eprintln!("Error: {}", error);
                ExitCode::FAILURE
            }
        };
    }

    match dotstore_repl::run(db, args.edit_mode()) {
        Ok(db) => match finish(db) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("Error: {}", error);
                ExitCode::FAILURE
            }
        },
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}
