use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

/// Accepted input lines, newest last, mirrored to an append-only file.
pub struct History {
    path: Option<PathBuf>,
    max_len: usize,
    entries: VecDeque<String>,
}

impl History {
    /// In-memory only; nothing is written to disk.
    pub fn in_memory(max_len: usize) -> Self {
        History {
            path: None,
            max_len: max_len.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Reads `path`, keeping the newest `max_len` lines. A longer file is
    /// rewritten with only those lines. A missing file is an empty history.
    pub fn load(path: &Path, max_len: usize) -> io::Result<Self> {
        let mut history = History {
            path: Some(path.to_path_buf()),
            ..History::in_memory(max_len)
        };
        match fs::read_to_string(path) {
            Ok(text) => {
                let mut total = 0;
                for line in text.lines().filter(|l| !l.trim().is_empty()) {
                    history.push(line.to_string());
                    total += 1;
                }
                debug!("loaded {} history entries from {}", history.len(), path.display());
                if total > history.len() {
                    history.rewrite()?;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(history)
    }

    /// Appends a non-empty line to memory and to the history file.
    pub fn record(&mut self, line: &str) -> io::Result<()> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Ok(());
        }
        self.push(line.to_string());
        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }

    fn rewrite(&self) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut text = String::new();
        for line in &self.entries {
            text.push_str(line);
            text.push('\n');
        }
        debug!("trimming {} to {} entries", path.display(), self.entries.len());
        fs::write(path, text)
    }

    fn push(&mut self, line: String) {
        if self.entries.len() == self.max_len {
            self.entries.pop_front();
        }
        self.entries.push_back(line);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("dsh-history-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let _ = fs::create_dir_all(&dir);
        dir
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_record_and_reload() {
        let path = scratch("reload").join("history");
        let mut history = History::load(&path, 10).unwrap();
        assert!(history.is_empty());

        history.record("ls -l\n").unwrap();
        history.record("   ").unwrap();
        history.record("echo hi | cat").unwrap();
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["ls -l", "echo hi | cat"]);

        let reloaded = History::load(&path, 10).unwrap();
        assert_eq!(reloaded.iter().collect::<Vec<_>>(), vec!["ls -l", "echo hi | cat"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_load_keeps_newest() {
        let path = scratch("newest").join("history");
        fs::write(&path, "one\ntwo\n\nthree\nfour\n").unwrap();
        let history = History::load(&path, 2).unwrap();
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["three", "four"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_load_trims_file() {
        let path = scratch("trim").join("history");
        fs::write(&path, "one\ntwo\nthree\n").unwrap();
        let mut history = History::load(&path, 2).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two\nthree\n");

        history.record("four").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two\nthree\nfour\n");
        let reloaded = History::load(&path, 2).unwrap();
        assert_eq!(reloaded.iter().collect::<Vec<_>>(), vec!["three", "four"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "three\nfour\n");
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_in_memory_cap() {
        let mut history = History::in_memory(2);
        for line in ["a", "b", "c"] {
            history.record(line).unwrap();
        }
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["b", "c"]);
    }
}
