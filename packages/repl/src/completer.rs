use reedline::{Completer, Span, Suggestion};

use crate::commands::COMMANDS;

/// Completes command names at the start of the line.
#[derive(Debug, Default)]
pub struct ReplCompleter;

impl ReplCompleter {
    pub fn new() -> Self {
        Self
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos.min(line.len())];
        let prefix = line_to_pos.trim_start();
        if prefix.contains(char::is_whitespace) {
            return Vec::new();
        }
        let start = line_to_pos.len() - prefix.len();
        let prefix = prefix.to_lowercase();

        COMMANDS
            .iter()
            .filter(|cmd| cmd.name.starts_with(&prefix))
            .map(|cmd| Suggestion {
                value: cmd.name.to_string(),
                description: Some(cmd.description.to_string()),
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: true,
                match_indices: None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(line: &str) -> Vec<String> {
        ReplCompleter::new()
            .complete(line, line.len())
            .into_iter()
            .map(|s| s.value)
            .collect()
    }

    #[test]
    fn completes_command_prefixes() {
        assert_eq!(values("fi"), vec!["find", "findone"]);
        assert_eq!(values("  co"), vec!["count", "collections"]);
        assert_eq!(values("").len(), COMMANDS.len());
    }

    #[test]
    fn no_completion_after_command() {
        assert!(values("find us").is_empty());
    }

    #[test]
    fn span_covers_the_typed_word() {
        let suggestions = ReplCompleter::new().complete("  cl", 4);
        assert_eq!(suggestions[0].span, Span::new(2, 4));
    }
}
