use crate::commands::dispatcher::CommandDispatcher;
use crate::config::Config;
use crate::core::error::SmartCloudError;

use console::style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Context, EditMode, Editor, Helper};
use std::borrow::Cow;

/// Completes slash commands and hints from input history.
pub struct ChatHelper {
    commands: CommandDispatcher,
    history_hinter: HistoryHinter,
}

impl ChatHelper {
    pub fn new(commands: CommandDispatcher) -> Self {
        Self {
            commands,
            history_hinter: HistoryHinter {},
        }
    }

    fn command_matches(&self, partial: &str) -> Vec<Pair> {
        self.commands
            .get_command_names()
            .into_iter()
            .filter(|cmd| cmd.starts_with(partial))
            .map(|cmd| Pair {
                display: format!("/{}", cmd),
                replacement: cmd,
            })
            .collect()
    }
}

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only the command name itself is completed, never its arguments.
        match line[..pos].strip_prefix('/') {
            Some(partial) if !partial.contains(' ') => Ok((1, self.command_matches(partial))),
            _ => Ok((pos, Vec::new())),
        }
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.history_hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ChatHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(style(hint).dim().to_string())
    }
}

impl Validator for ChatHelper {}

/// Creates a configured rustyline editor
pub fn create_editor(
    commands: CommandDispatcher,
) -> Result<Editor<ChatHelper, FileHistory>, SmartCloudError> {
    let config = rustyline::Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut editor = Editor::with_config(config)
        .map_err(|e| SmartCloudError::Input(format!("Failed to create line editor: {}", e)))?;
    editor.set_helper(Some(ChatHelper::new(commands)));

    // A missing history file is normal on first run.
    let _ = editor.load_history(&Config::input_history_path());

    Ok(editor)
}

/// Reads one line. `None` means the user pressed Ctrl-C or Ctrl-D.
pub fn read_input(
    editor: &mut Editor<ChatHelper, FileHistory>,
    session_id: &str,
) -> Result<Option<String>, SmartCloudError> {
    let prompt = if cfg!(windows) && std::env::var("PSModulePath").is_ok() {
        format!("[{}] > ", session_id)
    } else {
        format!(
            "{} {} ",
            style(format!("[{}]", session_id)).dim(),
            style(">").bold().cyan()
        )
    };

    match editor.readline(&prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                editor
                    .add_history_entry(line.as_str())
                    .map_err(|e| SmartCloudError::Input(format!("Failed to add history entry: {}", e)))?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
            println!("Exiting...");
            Ok(None)
        }
        Err(err) => Err(SmartCloudError::Input(format!("Input error: {}", err))),
    }
}

pub fn save_history(editor: &mut Editor<ChatHelper, FileHistory>) -> Result<(), SmartCloudError> {
    let history_path = Config::input_history_path();

    if let Some(parent) = history_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    editor
        .save_history(&history_path)
        .map_err(|e| SmartCloudError::Input(format!("Failed to save history: {}", e)))
}
