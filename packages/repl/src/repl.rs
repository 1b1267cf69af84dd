//! Host-independent shell loop.

use dotstore::Database;

use crate::commands::{self, CommandResult};
use crate::host::{EditMode, TerminalHost};
use crate::io::{ExitReason, IoError, IoHost, Output, PromptConfig, Signal};

/// The shell loop, driving a `Database` through an `IoHost`.
pub struct ReplCore {
    db: Database,
}

impl ReplCore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Read and execute commands until the user exits.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        io.write_output(Output::banner(banner()))?;

        loop {
            self.update_prompt(io)?;
            io.wait_for_input()?;

            if let Some(signal) = io.read_signal()? {
                match signal {
                    Signal::Eof => {
                        io.write_output(Output::info("Goodbye!"))?;
                        io.flush()?;
                        return Ok(ExitReason::Eof);
                    }
                    Signal::Interrupt => {
                        io.write_output(Output::info("^C (use 'exit' to quit)"))?;
                        continue;
                    }
                }
            }

            let Some(input) = io.read_input()? else {
                continue;
            };

            match commands::execute(&input.line, &mut self.db) {
                CommandResult::Ok { message, value } => {
                    if let Some(value) = value {
                        io.write_output(Output::normal(commands::format_json(&value)))?;
                    }
                    if let Some(message) = message {
                        io.write_output(Output::info(message))?;
                    }
                }
                CommandResult::Error(msg) => {
                    io.write_output(Output::error(msg))?;
                }
                CommandResult::Help => {
                    io.write_output(Output::normal(commands::format_help()))?;
                }
                CommandResult::Exit => {
                    io.write_output(Output::info("Goodbye!"))?;
                    io.flush()?;
                    return Ok(ExitReason::UserExit);
                }
            }

            io.flush()?;
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    pub fn into_database(self) -> Database {
        self.db
    }

    fn update_prompt(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write_prompt(PromptConfig {
            location: self.db.store_ref().location(),
            collection_count: self.db.collection_names().len(),
        })
    }
}

fn banner() -> String {
    format!(
        "dotstore {}\nType 'help' for available commands, 'exit' to quit.\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Run an interactive session on the terminal.
///
/// Returns the database so the caller can close it and see any final
/// write error.
pub fn run(db: Database, mode: EditMode) -> Result<Database, IoError> {
    let mut host = TerminalHost::new(mode)?;
    let mut core = ReplCore::new(db);
    let reason = core.run(&mut host)?;
    tracing::debug!(?reason, "shell finished");
    Ok(core.into_database())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{OutputStyle, ScriptedHost};
    use dotstore::{Query, StoreConfig};
    use serde_json::json;

    #[test]
    fn test_exit_command() {
        let mut core = ReplCore::new(Database::in_memory());
        let mut host = ScriptedHost::with_lines(["exit"]);

        let result = core.run(&mut host);

        assert!(matches!(result, Ok(ExitReason::UserExit)));
        assert!(host.outputs().iter().any(|o| o.text.contains("Goodbye")));
    }

    #[test]
    fn test_eof_signal() {
        let mut core = ReplCore::new(Database::in_memory());
        let mut host = ScriptedHost::new().signal(Signal::Eof).line("set never 1");

        let result = core.run(&mut host);

        assert!(matches!(result, Ok(ExitReason::Eof)));
        assert!(!core.database().store_ref().has("never").unwrap());
    }

    #[test]
    fn test_interrupt_continues() {
        let mut core = ReplCore::new(Database::in_memory());
        let mut host = ScriptedHost::new()
            .signal(Signal::Interrupt)
            .line("set a 1")
            .line("quit");

        assert!(matches!(core.run(&mut host), Ok(ExitReason::UserExit)));
        assert_eq!(
            core.database().store_ref().get("a").unwrap(),
            Some(json!(1))
        );
    }

    #[test]
    fn test_session_against_database() {
        let mut core = ReplCore::new(Database::in_memory());
        let mut host = ScriptedHost::with_lines([
            "insert users [{\"name\": \"A\"}, {\"name\": \"B\"}]",
            "remove users {\"name\": \"A\"}",
            "count users",
            "bogus",
            "exit",
        ]);

        core.run(&mut host).unwrap();

        assert_eq!(host.errors().len(), 1);
        assert!(host.errors()[0].contains("bogus"));
        assert!(host
            .texts(OutputStyle::Info)
            .contains(&"removed 1 document(s)"));

        let users = core.database_mut().collection("users").unwrap();
        assert_eq!(users.count(&Query::new()), 1);
    }

    #[test]
    fn test_prompt_tracks_collections() {
        let mut core = ReplCore::new(Database::open(StoreConfig::memory()));
        let mut host = ScriptedHost::with_lines(["insert a {}", "insert b {}"]);

        core.run(&mut host).unwrap();

        let prompt = host.last_prompt().unwrap();
        assert_eq!(prompt.location, ":memory:");
        assert_eq!(prompt.collection_count, 2);
    }

    #[test]
    fn test_help_lists_commands() {
        let mut core = ReplCore::new(Database::in_memory());
        let mut host = ScriptedHost::with_lines(["help"]);

        core.run(&mut host).unwrap();

        let help = host
            .texts(OutputStyle::Normal)
            .into_iter()
            .find(|text| text.contains("collections"))
            .unwrap();
        assert!(help.contains("findone"));
        assert!(host.flush_count() >= 2);
    }

    #[test]
    fn test_session_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default().with_file(dir.path().join("shell.json"));

        let mut core = ReplCore::new(Database::open(config.clone()));
        let mut host = ScriptedHost::with_lines(["set greeting \"hi\"", "exit"]);
        core.run(&mut host).unwrap();
        core.into_database().close().unwrap();

        let db = Database::open(config);
        assert_eq!(
            db.store_ref().get("greeting").unwrap(),
            Some(json!("hi"))
        );
    }
}
