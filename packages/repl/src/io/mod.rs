//! I/O seam between the shell core and its host.
//!
//! `ReplCore` only talks to an `IoHost`, so the same loop runs against a
//! terminal or a scripted host in tests.

pub mod types;

#[cfg(test)]
pub mod test_host;

pub use types::*;

#[cfg(test)]
pub use test_host::ScriptedHost;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("line editor error: {0}")]
    Editor(String),
}

impl From<std::io::Error> for IoError {
    fn from(error: std::io::Error) -> Self {
        IoError::Io(error.to_string())
    }
}

/// Host interface for shell I/O.
pub trait IoHost {
    /// Block until the user has entered a line or sent a signal.
    ///
    /// Afterwards exactly one of `read_input` and `read_signal` returns
    /// `Some`.
    fn wait_for_input(&mut self) -> Result<(), IoError>;

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError>;

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError>;

    fn write_output(&mut self, output: Output) -> Result<(), IoError>;

    /// Set what the prompt shows before the next input.
    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
