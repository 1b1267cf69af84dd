//! Scripted host for driving the shell loop in tests.

use std::collections::VecDeque;

use super::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

enum Step {
    Line(String),
    Signal(Signal),
}

/// Replays a fixed script of lines and signals and records everything the
/// shell writes. An exhausted script reads as Ctrl+D, so a run always ends.
#[derive(Default)]
pub struct ScriptedHost {
    script: VecDeque<Step>,
    current: Option<Step>,
    outputs: Vec<Output>,
    prompts: Vec<PromptConfig>,
    flushes: usize,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut host = Self::new();
        for line in lines {
            host = host.line(line);
        }
        host
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.script.push_back(Step::Line(line.into()));
        self
    }

    pub fn signal(mut self, signal: Signal) -> Self {
        self.script.push_back(Step::Signal(signal));
        self
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Text of every output with the given style.
    pub fn texts(&self, style: OutputStyle) -> Vec<&str> {
        self.outputs
            .iter()
            .filter(|o| o.style == style)
            .map(|o| o.text.as_str())
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.texts(OutputStyle::Error)
    }

    pub fn last_prompt(&self) -> Option<&PromptConfig> {
        self.prompts.last()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl IoHost for ScriptedHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        self.current = Some(
            self.script
                .pop_front()
                .unwrap_or(Step::Signal(Signal::Eof)),
        );
        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        match self.current.take() {
            Some(Step::Line(line)) => Ok(Some(InputLine { line })),
            other => {
                self.current = other;
                Ok(None)
            }
        }
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        match self.current.take() {
            Some(Step::Signal(signal)) => Ok(Some(signal)),
            other => {
                self.current = other;
                Ok(None)
            }
        }
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        self.outputs.push(output);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.prompts.push(config);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_lines_then_eof() {
        let mut host = ScriptedHost::with_lines(["one", "two"]);

        host.wait_for_input().unwrap();
        assert_eq!(host.read_signal().unwrap(), None);
        assert_eq!(host.read_input().unwrap(), Some(InputLine::new("one")));

        host.wait_for_input().unwrap();
        assert_eq!(host.read_input().unwrap(), Some(InputLine::new("two")));

        host.wait_for_input().unwrap();
        assert_eq!(host.read_input().unwrap(), None);
        assert_eq!(host.read_signal().unwrap(), Some(Signal::Eof));
    }

    #[test]
    fn records_output_by_style() {
        let mut host = ScriptedHost::new();
        host.write_output(Output::normal("a")).unwrap();
        host.write_output(Output::error("b")).unwrap();
        host.flush().unwrap();

        assert_eq!(host.outputs().len(), 2);
        assert_eq!(host.errors(), vec!["b"]);
        assert_eq!(host.flush_count(), 1);
    }
}
