//! Messages exchanged between the shell core and its host.

use serde::{Deserialize, Serialize};

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLine {
    pub line: String,
}

impl InputLine {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "lowercase")]
pub enum Signal {
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D
    Eof,
}

/// Text for the host to show, with a style hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub text: String,
    #[serde(default)]
    pub style: OutputStyle,
}

impl Output {
    pub fn normal(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Normal)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Error)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Info)
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Banner)
    }

    fn styled(text: impl Into<String>, style: OutputStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Already formatted; may contain ANSI codes.
    #[default]
    Normal,
    Error,
    Info,
    Banner,
}

/// What the prompt should show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Where the database is persisted (`:memory:` or a file path).
    pub location: String,
    pub collection_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` or `quit`
    UserExit,
    /// Ctrl+D, or the host ran out of input.
    Eof,
}
