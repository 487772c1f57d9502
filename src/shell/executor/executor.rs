use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use log::{debug, warn};
use nix::errno::Errno;
use nix::fcntl::{fcntl, open, FcntlArg, FdFlag, OFlag};
use nix::sys::stat::Mode;
use nix::sys::wait::waitpid;
use nix::unistd::{close, dup2, execvp, fork, pipe2, ForkResult, Pid};

use crate::shell::context::ShellContext;
use crate::shell::error::{Result, ShellError};
use crate::shell::parser::{Pipeline, StageKind};
use crate::shell::signals;

use super::builtin::{Builtin, Flow};
use super::job_manager::{status_code, Job, JobManager};
use super::plan::{plan, Condition, Invocation, Redirect, Unit};

/// Exit status of a child whose program image could not be replaced.
const EXIT_EXEC_FAILED: i32 = 127;
/// Exit status of a child whose redirections could not be set up.
const EXIT_REDIRECT_FAILED: i32 = 1;

pub struct Executor {
    jobs: JobManager,
}

impl Executor {
    pub fn new(jobs: JobManager) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    /// Background jobs that finished since the last call.
    pub fn reap_background(&mut self) -> Vec<Job> {
        self.jobs.reap()
    }

    /// Runs every unit of the pipeline in order. Returns only after all
    /// foreground processes have exited.
    pub fn execute(&mut self, pipeline: &Pipeline, ctx: &mut ShellContext) -> Result<Flow> {
        for unit in plan(pipeline) {
            if unit.condition == Condition::OnSuccess && ctx.last_status != 0 {
                debug!("skipping `{}`: last status {}", unit, ctx.last_status);
                continue;
            }

            if let Some((builtin, command)) = builtin_of(&unit) {
                if unit.commands.len() > 1 || !command.redirects.is_empty() {
                    warn!("built-ins do not take part in pipes or redirections: `{}`", unit);
                }
                if builtin.run(&command.argv[1..], ctx, &mut io::stdout()) == Flow::Exit {
                    return Ok(Flow::Exit);
                }
                continue;
            }

            self.run_unit(&unit, ctx)?;
        }
        Ok(Flow::Continue)
    }

    fn run_unit(&mut self, unit: &Unit<'_>, ctx: &mut ShellContext) -> Result<()> {
        // Convert every argv before forking so a bad argument spawns nothing.
        let argvs = unit
            .commands
            .iter()
            .map(|command| to_cstrings(command.argv))
            .collect::<Result<Vec<_>>>()?;

        let last = unit.commands.len().saturating_sub(1);
        let mut input: Option<OwnedFd> = None;
        let mut children = Vec::with_capacity(unit.commands.len());

        for (i, (command, argv)) in unit.commands.iter().zip(&argvs).enumerate() {
            let (next_input, output) = if i < last {
                let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(ShellError::Pipe)?;
                (Some(read), Some(write))
            } else {
                (None, None)
            };

            if argv.is_empty() {
                debug!("empty command in `{}`, nothing to spawn", unit);
            } else {
                let wiring = Wiring {
                    stdin: input.as_ref().map(AsRawFd::as_raw_fd),
                    stdout: output.as_ref().map(AsRawFd::as_raw_fd),
                    redirects: &command.redirects,
                };
                children.push(spawn(argv, &wiring)?);
            }

            // The parent keeps neither the write end it handed off nor the
            // read end the child just inherited.
            drop(output);
            input = next_input;
        }
        drop(input);

        if children.is_empty() {
            return Ok(());
        }

        if unit.background {
            let job = self.jobs.add_job(children, unit.to_string());
            println!("{}", job.started());
            return Ok(());
        }

        let mut status = 0;
        for pid in children {
            status = wait_for(pid)?;
        }
        debug!("`{}` exited with {}", unit, status);
        ctx.last_status = status;
        Ok(())
    }
}

/// The built-in named by the first command of a unit, if any.
fn builtin_of<'u, 'p>(unit: &'u Unit<'p>) -> Option<(Builtin, &'u Invocation<'p>)> {
    let command = unit.commands.first()?;
    let builtin = Builtin::lookup(command.program()?)?;
    Some((builtin, command))
}

fn to_cstrings(argv: &[String]) -> Result<Vec<CString>> {
    argv.iter()
        .map(|arg| CString::new(arg.as_str()).map_err(ShellError::from))
        .collect()
}

/// Descriptor plan for one child: pipe ends first, then redirections in
/// order, so an explicit redirection wins over a pipe.
struct Wiring<'u> {
    stdin: Option<RawFd>,
    stdout: Option<RawFd>,
    redirects: &'u [Redirect<'u>],
}

impl Wiring<'_> {
    fn apply(&self) -> std::result::Result<(), String> {
        if let Some(fd) = self.stdin {
            move_fd(fd, libc::STDIN_FILENO).map_err(|e| format!("stdin: {}", e))?;
        }
        if let Some(fd) = self.stdout {
            move_fd(fd, libc::STDOUT_FILENO).map_err(|e| format!("stdout: {}", e))?;
        }
        for redirect in self.redirects {
            let (flags, stream) = match redirect.kind {
                StageKind::RedirectIn => (OFlag::O_RDONLY, libc::STDIN_FILENO),
                StageKind::RedirectOut => (
                    OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
                    libc::STDOUT_FILENO,
                ),
                StageKind::RedirectAppend => (
                    OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
                    libc::STDOUT_FILENO,
                ),
                StageKind::RedirectErr => (
                    OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
                    libc::STDERR_FILENO,
                ),
                _ => continue,
            };
            let fd = open(
                redirect.target,
                flags | OFlag::O_CLOEXEC,
                Mode::from_bits_truncate(0o644),
            )
            .map_err(|e| format!("{}: {}", redirect.target, e))?;
            move_fd(fd, stream).map_err(|e| format!("{}: {}", redirect.target, e))?;
        }
        Ok(())
    }
}

/// Duplicates `fd` onto `stream` and closes the original. A descriptor
/// already sitting on `stream` only loses its close-on-exec flag.
fn move_fd(fd: RawFd, stream: RawFd) -> nix::Result<()> {
    if fd == stream {
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))?;
    } else {
        dup2(fd, stream)?;
        close(fd)?;
    }
    Ok(())
}

fn spawn(argv: &[CString], wiring: &Wiring<'_>) -> Result<Pid> {
    // SAFETY: the child only resets a signal, rewires descriptors and then
    // execs or exits.
    match unsafe { fork() }.map_err(ShellError::Fork)? {
        ForkResult::Parent { child } => {
            debug!("spawned {} for {:?}", child, argv);
            Ok(child)
        }
        ForkResult::Child => {
            let code = exec_child(argv, wiring);
            // SAFETY: leaves without running the interpreter's exit handlers.
            unsafe { libc::_exit(code) }
        }
    }
}

fn exec_child(argv: &[CString], wiring: &Wiring<'_>) -> i32 {
    signals::restore_default_interrupt();
    if let Err(e) = wiring.apply() {
        eprintln!("dsh: {}", e);
        return EXIT_REDIRECT_FAILED;
    }
    let errno = match execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    eprintln!("dsh: {}: {}", argv[0].to_string_lossy(), errno.desc());
    EXIT_EXEC_FAILED
}

fn wait_for(pid: Pid) -> Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(code) = status_code(status) {
                    return Ok(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ShellError::Wait(e)),
        }
    }
}
