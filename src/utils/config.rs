use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_HISTORY_SIZE: usize = 1000;

pub struct Config {
    pub name: String,
    pub config_dir: PathBuf,
    pub rc_file: PathBuf,
    pub prompt_theme: bool,
    pub prompt_symbol: String,
    pub tab_completion: bool,
    pub hints: bool,
    pub history_file: PathBuf,
    pub history_size: usize,
    pub editor: Option<String>,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    /// Problems found while loading, logged once the logger is up.
    pub diagnostics: Vec<String>,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/dsh")
        } else {
            PathBuf::from("tmp")
        }
    }

    fn defaults() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from("dsh"),
            rc_file: config_dir.join("dshrc"),
            prompt_theme: true,
            prompt_symbol: String::from(">"),
            tab_completion: true,
            hints: false,
            history_file: config_dir.join(".dsh_history"),
            history_size: DEFAULT_HISTORY_SIZE,
            editor: env::var("EDITOR").ok().filter(|e| !e.is_empty()),
            editor_mode: String::from("emacs"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
            config_dir,
            diagnostics: Vec::new(),
        }
    }

    pub fn new() -> Self {
        // .env first so DSH_* overrides can live there
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::defaults();

        if let Ok(rc) = env::var("DSH_CONFIG") {
            config.rc_file = PathBuf::from(shellexpand::tilde(&rc).as_ref());
        }
        let rc_file = config.rc_file.clone();
        config.load_rc_file(&rc_file);

        if let Ok(history) = env::var("DSH_HISTORY") {
            config.history_file = PathBuf::from(shellexpand::tilde(&history).as_ref());
        }
        if let Ok(level) = env::var("DSH_LOG_LEVEL") {
            config.logger_level = level;
        }
        if let Ok(mode) = env::var("DSH_EDIT_MODE") {
            config.editor_mode = mode;
        }

        if let Some(parent) = config.history_file.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                config
                    .diagnostics
                    .push(format!("cannot create {}: {}", parent.display(), e));
            }
        }

        config
    }

    /// A missing resource file is not an error; the defaults stand.
    fn load_rc_file(&mut self, path: &Path) {
        match fs::read_to_string(path) {
            Ok(text) => self.apply_rc(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => self
                .diagnostics
                .push(format!("cannot read {}: {}", path.display(), e)),
        }
    }

    /// Applies `KEY=VALUE` or `KEY VALUE` lines. Unknown keys are ignored.
    pub fn apply_rc(&mut self, text: &str) {
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = split_entry(line) else {
                self.diagnostics
                    .push(format!("dshrc:{}: expected KEY=VALUE", number + 1));
                continue;
            };
            self.apply_entry(number + 1, key, value);
        }
    }

    fn apply_entry(&mut self, number: usize, key: &str, value: &str) {
        match key {
            "PROMPT_THEME" => self.set_flag(number, key, value, |c, v| c.prompt_theme = v),
            "TAB_COMPLETION" => self.set_flag(number, key, value, |c, v| c.tab_completion = v),
            "HINTS" => self.set_flag(number, key, value, |c, v| c.hints = v),
            "PROMPT_SYMBOL" => self.prompt_symbol = value.to_string(),
            "HISTORY_FILE" => {
                self.history_file = PathBuf::from(shellexpand::tilde(value).as_ref());
            }
            "HISTORY_SIZE" => match value.parse::<usize>() {
                Ok(size) if size > 0 => self.history_size = size,
                _ => self.diagnostics.push(format!(
                    "dshrc:{}: HISTORY_SIZE must be a positive integer, got {:?}",
                    number, value
                )),
            },
            "EDITOR" => self.editor = Some(shellexpand::tilde(value).into_owned()),
            "EDIT_MODE" => self.editor_mode = value.to_string(),
            "LOG_LEVEL" => self.logger_level = value.to_string(),
            _ => {}
        }
    }

    fn set_flag(&mut self, number: usize, key: &str, value: &str, set: fn(&mut Config, bool)) {
        match parse_bool(value) {
            Some(flag) => set(self, flag),
            None => self.diagnostics.push(format!(
                "dshrc:{}: {} expects a boolean, got {:?}",
                number, key, value
            )),
        }
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::defaults()
    }
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let split = line
        .split_once('=')
        .or_else(|| line.split_once(char::is_whitespace))?;
    let key = split.0.trim();
    if key.is_empty() {
        return None;
    }
    let value = split.1.trim().trim_matches('"');
    Some((key, value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
