use std::borrow::Cow;

use colored::Colorize;
use log::debug;
pub use rustyline::error::ReadlineError;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config as RLConfig, Context, Editor, Helper};

use crate::shell::history::History;
use crate::utils::config::Config;

/// Filename completion and history hints, each switchable from the config.
pub struct LineHelper {
    completer: FilenameCompleter,
    hinter: HistoryHinter,
    completion: bool,
    hints: bool,
}

impl Completer for LineHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if self.completion {
            self.completer.complete(line, pos, ctx)
        } else {
            Ok((pos, Vec::new()))
        }
    }
}

impl Hinter for LineHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        if self.hints {
            self.hinter.hint(line, pos, ctx)
        } else {
            None
        }
    }
}

impl Highlighter for LineHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for LineHelper {}

impl Helper for LineHelper {}

pub struct ReadlineManager {
    editor: Editor<LineHelper, DefaultHistory>,
}

impl ReadlineManager {
    pub fn new(config: &Config) -> Result<Self, ReadlineError> {
        let rl_config = RLConfig::builder()
            .history_ignore_space(true)
            .auto_add_history(false)
            .max_history_size(config.history_size)?
            .completion_type(CompletionType::List)
            .edit_mode(config.get_edit_mode())
            .build();

        let mut editor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(LineHelper {
            completer: FilenameCompleter::new(),
            hinter: HistoryHinter::new(),
            completion: config.tab_completion,
            hints: config.hints,
        }));
        Ok(Self { editor })
    }

    /// Makes earlier sessions reachable with the arrow keys and hints.
    pub fn seed(&mut self, history: &History) -> Result<(), ReadlineError> {
        for line in history.iter() {
            self.editor.add_history_entry(line)?;
        }
        debug!("line editor seeded with {} entries", history.len());
        Ok(())
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.editor.readline(prompt)
    }

    pub fn add_history(&mut self, line: &str) -> Result<bool, ReadlineError> {
        self.editor.add_history_entry(line)
    }
}
