use std::ffi::NulError;
use std::io;

use nix::errno::Errno;
use rustyline::error::ReadlineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}: undefined variable")]
    UndefinedVariable(String),

    #[error("no editor configured (set EDITOR in the dshrc file or the environment)")]
    EditorNotConfigured,

    #[error("syntax error: missing redirection target after `{0}`")]
    MissingRedirectTarget(&'static str),

    #[error("argument contains a NUL byte: {0}")]
    Nul(#[from] NulError),

    #[error("pipe: {0}")]
    Pipe(Errno),

    #[error("fork: {0}")]
    Fork(Errno),

    #[error("wait: {0}")]
    Wait(Errno),

    #[error("signal: {0}")]
    Signal(Errno),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Readline(#[from] ReadlineError),
}

impl ShellError {
    /// Pipe and fork failures leave the pipeline half built; the interpreter
    /// cannot continue consistently after them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Pipe(_) | ShellError::Fork(_))
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
