//! OS-level termination requests and exit status rendering.
//!
//! Stop is a request, not a state change: we send SIGTERM by PID and let
//! the exit notification path observe whatever happens next. There is no
//! SIGKILL escalation and no timeout; a process that ignores SIGTERM is
//! still considered running until it actually exits.

use std::io;
use std::process::ExitStatus;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Ask a running process to terminate.
///
/// ESRCH ("no such process") is success: the process is already gone and
/// its exit notification is on the way.
pub fn request_termination(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        match signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "termination by PID is only supported on unix",
        ))
    }
}

/// Human-readable reason for a process exit.
///
/// Matches the wording the dashboard has always shown: exit code when the
/// process terminated normally, signal name when it was killed.
pub fn exit_message(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("Process exited with code: {code}");
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(raw) = status.signal() {
            let name = Signal::try_from(raw)
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|_| format!("signal {raw}"));
            return format!("Process was killed with signal: {name}");
        }
    }

    "Process exited".to_string()
}
