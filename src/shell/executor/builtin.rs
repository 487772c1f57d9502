use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use log::{debug, warn};

use crate::shell::context::ShellContext;
use crate::utils::path::home_dir;

const HELP: &str = "\
DSH - Dash Shell

Built-in commands:
  cd [dir]     change the working directory (default: home)
  exit         leave the shell
  help         show this text
  history      print the command history

Operators (separate them with spaces):
  a | b        pipe the output of a into b
  a < file     read standard input from file
  a > file     write standard output to file
  a >> file    append standard output to file
  a 2> file    write standard error to file
  a &          run a in the background
  a ; b        run a, then b
  a && b       run b only if a succeeded

Substitutions:
  $NAME        value of the environment variable NAME
  $EDITOR      the configured editor
  ~            your home directory
  \"a b\"        one argument, taken verbatim
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Exit,
    Help,
    History,
}

/// What the read loop does after a built-in ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

impl Builtin {
    pub fn lookup(program: &str) -> Option<Builtin> {
        match program {
            "cd" => Some(Builtin::Cd),
            "exit" => Some(Builtin::Exit),
            "help" => Some(Builtin::Help),
            "history" => Some(Builtin::History),
            _ => None,
        }
    }

    /// Runs in the interpreter process. Sets `ctx.last_status`.
    pub fn run(self, args: &[String], ctx: &mut ShellContext, out: &mut dyn Write) -> Flow {
        debug!("builtin {:?} {:?}", self, args);
        let result = match self {
            Builtin::Cd => builtin_cd(args),
            Builtin::Exit => return Flow::Exit,
            Builtin::Help => out.write_all(HELP.as_bytes()),
            Builtin::History => builtin_history(ctx, out),
        };
        ctx.last_status = match result {
            Ok(()) => 0,
            Err(e) => {
                warn!("{:?} failed: {}", self, e);
                let _ = writeln!(io::stderr(), "{}", e);
                1
            }
        };
        Flow::Continue
    }
}

fn builtin_cd(args: &[String]) -> io::Result<()> {
    let target = match args.first() {
        Some(path) => PathBuf::from(path),
        None => home_dir(),
    };
    env::set_current_dir(&target)
        .map_err(|e| io::Error::new(e.kind(), format!("cd: {}: {}", target.display(), e)))
}

fn builtin_history(ctx: &ShellContext, out: &mut dyn Write) -> io::Result<()> {
    for line in ctx.history.iter() {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}
