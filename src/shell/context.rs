use crate::shell::history::History;
use crate::utils::config::Config;

/// Interpreter-wide state handed to the parser, the executor and the
/// built-ins. The working directory is process state and lives in the OS.
pub struct ShellContext {
    pub config: Config,
    pub history: History,
    /// Exit status of the most recent foreground unit.
    pub last_status: i32,
}

impl ShellContext {
    pub fn new(config: Config, history: History) -> Self {
        ShellContext {
            config,
            history,
            last_status: 0,
        }
    }
}
