//! # dotstore-repl
//!
//! An interactive shell over a dotstore database.
//!
//! ## Features
//!
//! - Read and write values at key paths
//! - Insert, query, update and remove collection documents
//! - Tab completion and highlighting for commands
//! - Vi mode (from `--vi`, `EDITOR`, `.inputrc` or `DOTSTORE_EDIT_MODE`)
//! - Command history
//!
//! ## Usage
//!
//! ```bash
//! dotstore --file data.json
//!
//! > set settings.theme "dark"
//! > insert users {"name": "Bob", "age": 24}
//! > update users {"name": "Bob"} {"age": 25}
//! > find users {"age": 25}
//!
//! # Or run one command and exit:
//! dotstore --file data.json find users
//! ```

pub mod commands;
pub mod completer;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod repl;

pub use host::EditMode;
pub use repl::{run, ReplCore};
