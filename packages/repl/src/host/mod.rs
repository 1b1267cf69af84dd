//! Interactive hosts for the shell.

pub mod terminal;

pub use terminal::{EditMode, TerminalHost};
