use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::commands::lookup;

/// Colours the command word, its key path or collection name, and any JSON
/// that follows.
#[derive(Debug, Default)]
pub struct ReplHighlighter;

impl ReplHighlighter {
    pub fn new() -> Self {
        Self
    }
}

impl Highlighter for ReplHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        if line.is_empty() {
            return styled;
        }

        let (command, rest) = match line.find(char::is_whitespace) {
            Some(pos) => line.split_at(pos),
            None => (line, ""),
        };

        let cmd_style = if lookup(command).is_some() {
            Style::new().bold().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::Red)
        };
        styled.push((cmd_style, command.to_string()));

        if rest.is_empty() {
            return styled;
        }

        // JSON starts at the first `{`, `[` or `"` that begins a new word after
        // the path or collection name.
        let json_start = rest.char_indices().find_map(|(i, c)| {
            let before = &rest[..i];
            let starts_word = before.ends_with(char::is_whitespace) && !before.trim().is_empty();
            (starts_word && matches!(c, '{' | '[' | '"')).then_some(i)
        });
        match json_start {
            Some(json_pos) => {
                let (target, json) = rest.split_at(json_pos);
                styled.push((Style::new().fg(Color::Yellow), target.to_string()));
                styled.push((Style::new().fg(Color::Green), json.to_string()));
            }
            _ => styled.push((Style::new().fg(Color::Yellow), rest.to_string())),
        }

        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(line: &str) -> Vec<String> {
        ReplHighlighter::new()
            .highlight(line, 0)
            .buffer
            .into_iter()
            .map(|(_, text)| text)
            .collect()
    }

    #[test]
    fn splits_command_target_and_json() {
        assert_eq!(
            parts("insert users {\"a\": 1}"),
            vec!["insert", " users ", "{\"a\": 1}"]
        );
        assert_eq!(parts("get a.b[0]"), vec!["get", " a.b[0]"]);
        assert_eq!(parts("all"), vec!["all"]);
    }

    #[test]
    fn unknown_commands_are_red() {
        let styled = ReplHighlighter::new().highlight("bogus x", 0);
        assert_eq!(styled.buffer[0].0, Style::new().fg(Color::Red));
    }

    #[test]
    fn preserves_the_whole_line() {
        let line = "update t {\"g\": 1} {\"x\": [1]} --multi";
        assert_eq!(parts(line).concat(), line);
    }
}
