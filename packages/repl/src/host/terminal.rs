//! Terminal host built on Reedline.
//!
//! Provides line editing (vi or emacs keys), command completion,
//! highlighting and persistent history.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditCommand, EditMode as ReedlineEditMode, Emacs, FileBackedHistory,
    KeyCode, KeyModifiers, Keybindings, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, Reedline, ReedlineEvent, ReedlineMenu, Signal as ReedlineSignal, Vi,
};

use crate::completer::ReplCompleter;
use crate::highlighter::ReplHighlighter;
use crate::io::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

const HISTORY_SIZE: usize = 1000;
const EDIT_MODE_ENV: &str = "DOTSTORE_EDIT_MODE";

/// Which key bindings the line editor uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Vi if `EDITOR`, `VISUAL`, `.inputrc` or `DOTSTORE_EDIT_MODE` ask for it.
    #[default]
    Detect,
    Vi,
    Emacs,
}

impl EditMode {
    fn use_vi(self) -> bool {
        match self {
            EditMode::Vi => true,
            EditMode::Emacs => false,
            EditMode::Detect => should_use_vi_mode(),
        }
    }
}

pub struct TerminalHost {
    line_editor: Reedline,
    pending_input: Option<InputLine>,
    pending_signal: Option<Signal>,
    current_prompt: PromptConfig,
}

impl TerminalHost {
    pub fn new(mode: EditMode) -> io::Result<Self> {
        let hinter = Box::new(
            DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
        );
        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("completion_menu")
                .with_text_style(Style::new().fg(Color::Cyan))
                .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold()),
        );

        let edit_mode: Box<dyn ReedlineEditMode> = if mode.use_vi() {
            let mut insert_keybindings = default_vi_insert_keybindings();
            add_tab_completion(&mut insert_keybindings);
            Box::new(Vi::new(insert_keybindings, default_vi_normal_keybindings()))
        } else {
            let mut keybindings = default_emacs_keybindings();
            add_tab_completion(&mut keybindings);
            keybindings.add_binding(
                KeyModifiers::CONTROL,
                KeyCode::Char('d'),
                ReedlineEvent::Edit(vec![EditCommand::Clear]),
            );
            Box::new(Emacs::new(keybindings))
        };

        let mut line_editor = Reedline::create()
            .with_completer(Box::new(ReplCompleter::new()))
            .with_highlighter(Box::new(ReplHighlighter::new()))
            .with_hinter(hinter)
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode);

        if let Some(history_path) = history_path() {
            if let Some(parent) = history_path.parent() {
                if let Err(error) = std::fs::create_dir_all(parent) {
                    tracing::debug!(%error, "cannot create history directory");
                }
            }
            match FileBackedHistory::with_file(HISTORY_SIZE, history_path) {
                Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                Err(error) => tracing::debug!(%error, "history disabled"),
            }
        }

        Ok(Self {
            line_editor,
            pending_input: None,
            pending_signal: None,
            current_prompt: PromptConfig::default(),
        })
    }
}

fn add_tab_completion(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
}

impl IoHost for TerminalHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        let prompt = TerminalPrompt::from_config(&self.current_prompt);

        match self.line_editor.read_line(&prompt) {
            Ok(ReedlineSignal::Success(line)) => self.pending_input = Some(InputLine { line }),
            Ok(ReedlineSignal::CtrlC) => self.pending_signal = Some(Signal::Interrupt),
            Ok(ReedlineSignal::CtrlD) => self.pending_signal = Some(Signal::Eof),
            Err(e) => return Err(IoError::Editor(e.to_string())),
        }

        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.pending_input.take())
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        Ok(self.pending_signal.take())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        let styled = match output.style {
            OutputStyle::Normal => output.text,
            OutputStyle::Error => {
                format!("{} {}", Color::Red.bold().paint("Error:"), output.text)
            }
            OutputStyle::Info | OutputStyle::Banner => Color::Cyan.paint(&output.text).to_string(),
        };
        println!("{}", styled);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.current_prompt = config;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush()?;
        Ok(())
    }
}

struct TerminalPrompt {
    location: String,
    collection_count: usize,
}

impl TerminalPrompt {
    fn from_config(config: &PromptConfig) -> Self {
        Self {
            location: config.location.clone(),
            collection_count: config.collection_count,
        }
    }
}

impl Prompt for TerminalPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let collections = match self.collection_count {
            0 => Color::DarkGray.paint("no collections").to_string(),
            1 => Color::Blue.bold().paint("1 collection").to_string(),
            n => Color::Blue
                .bold()
                .paint(format!("{} collections", n))
                .to_string(),
        };
        Cow::Owned(format!(
            "{} {}",
            Color::Yellow.paint(&self.location),
            collections
        ))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => {
                Cow::Owned(format!(" {} ", Color::Green.bold().paint(">")))
            }
            PromptEditMode::Vi(vi_mode) => {
                let indicator = match vi_mode {
                    reedline::PromptViMode::Normal => Color::Blue.bold().paint("[N]>"),
                    reedline::PromptViMode::Insert => Color::Green.bold().paint("[I]>"),
                };
                Cow::Owned(format!(" {} ", indicator))
            }
            PromptEditMode::Custom(s) => Cow::Owned(format!(" ({})> ", s)),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("dotstore").join("history.txt"))
}

fn names_vi(editor: &str) -> bool {
    let editor = editor.to_lowercase();
    editor.contains("vim") || editor == "vi" || editor.ends_with("/vi")
}

fn should_use_vi_mode() -> bool {
    if let Ok(mode) = std::env::var(EDIT_MODE_ENV) {
        let mode = mode.to_lowercase();
        return mode == "vi" || mode == "vim";
    }

    let from_editor = ["EDITOR", "VISUAL"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .any(|editor| names_vi(&editor));

    from_editor || inputrc_wants_vi()
}

/// Look for `set editing-mode vi` in the readline init files.
fn inputrc_wants_vi() -> bool {
    let candidates = [
        std::env::var("INPUTRC").ok().map(PathBuf::from),
        dirs::home_dir().map(|p| p.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .any(|content| {
            content.lines().any(|line| {
                let words: Vec<&str> = line.split_whitespace().collect();
                words == ["set", "editing-mode", "vi"]
            })
        })
}
