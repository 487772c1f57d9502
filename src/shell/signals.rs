use nix::sys::signal::{signal, SigHandler, Signal};

use crate::shell::error::{Result, ShellError};

/// The interpreter survives Ctrl-C; the foreground child takes it.
pub fn ignore_interrupt() -> Result<()> {
    // SAFETY: SIG_IGN installs no handler code.
    unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) }
        .map(|_| ())
        .map_err(ShellError::Signal)
}

/// Called in a freshly forked child before exec.
pub fn restore_default_interrupt() {
    // SAFETY: SIG_DFL installs no handler code.
    let _ = unsafe { signal(Signal::SIGINT, SigHandler::SigDfl) };
}
