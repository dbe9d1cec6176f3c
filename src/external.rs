use crate::command::{Continuation, Launcher, Streams};
use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use nix::errno::Errno;
use nix::libc::c_char;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};
use std::ffi::{CStr, CString};
use std::io::Write;
use std::os::fd::AsFd;
use std::ptr;
use tracing::{debug, trace};

const EXIT_FAILURE: i32 = 1;

/// How a reaped child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with the given status code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
}

impl Termination {
    /// Maps a wait report to a termination, or `None` when the child is still
    /// alive (stopped, continued, traced) and must be waited on again.
    pub fn from_status(status: WaitStatus) -> Option<Termination> {
        match status {
            WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(Termination::Signaled(signal)),
            _ => None,
        }
    }

    /// Shell-style status code: the exit code, or 128 + signal number.
    pub fn code(self) -> i32 {
        match self {
            Termination::Exited(code) => code,
            Termination::Signaled(signal) => 128 + signal as i32,
        }
    }
}

/// Command that is not a builtin, ready to be handed to `execvp`.
///
/// All allocation happens here, before the fork, so the child only has to
/// exec or report and exit.
pub struct ExternalCommand {
    program: CString,
    argv: Vec<CString>,
    // NULL-terminated pointers into `argv`; the CString buffers never move.
    argv_ptrs: Vec<*const c_char>,
}

impl ExternalCommand {
    /// Builds the C argument vector. `argv[0]` names the program and is also
    /// passed as the first argument.
    pub fn new(argv: &[&str]) -> Result<Self> {
        let argv = argv
            .iter()
            .map(|arg| {
                CString::new(*arg).map_err(|_| ShellError::InvalidArgument {
                    argument: arg.to_string(),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let program = argv.first().cloned().unwrap_or_default();
        let argv_ptrs = argv
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        Ok(Self {
            program,
            argv,
            argv_ptrs,
        })
    }

    /// Forks a child running this command and returns its pid.
    ///
    /// The child never returns from this function: it either becomes the
    /// program or exits with status 1 after writing `<prefix>: <program>: <reason>`.
    pub fn spawn(&self, diagnostic_prefix: &CStr) -> Result<Pid> {
        // Anything still buffered must reach the terminal before the child's output.
        if let Err(e) = std::io::stdout().flush() {
            tracing::warn!(error = %e, "could not flush stdout before fork");
        }

        // SAFETY: the child branch does not allocate; it only calls execvp,
        // write and _exit on data prepared before the fork.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => Ok(child),
            Ok(ForkResult::Child) => {
                // SAFETY: `program` and every non-null entry of `argv_ptrs` point
                // into live CStrings owned by `self`; the array ends with NULL.
                unsafe { nix::libc::execvp(self.program.as_ptr(), self.argv_ptrs.as_ptr()) };
                let errno = Errno::last();
                report_exec_failure(diagnostic_prefix, &self.program, errno);
                // SAFETY: terminates the child without running the parent's
                // atexit handlers or flushing its inherited buffers.
                unsafe { nix::libc::_exit(EXIT_FAILURE) }
            }
            Err(errno) => Err(ShellError::Fork(errno)),
        }
    }
}

fn report_exec_failure(prefix: &CStr, program: &CStr, errno: Errno) {
    let stderr = std::io::stderr();
    let fd = stderr.as_fd();
    let parts: [&[u8]; 6] = [
        prefix.to_bytes(),
        b": ",
        program.to_bytes(),
        b": ",
        errno.desc().as_bytes(),
        b"\n",
    ];
    for part in parts {
        let _ = nix::unistd::write(fd, part);
    }
}

/// Blocks until `pid` has exited or been killed by a signal.
///
/// Reports that the child stopped or continued do not end the wait; the
/// child is waited on again until it truly terminates.
pub fn wait_for_termination(pid: Pid) -> Result<Termination> {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(status) => match Termination::from_status(status) {
                Some(termination) => return Ok(termination),
                None => trace!(%pid, ?status, "child has not terminated, waiting again"),
            },
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ShellError::Wait { pid, errno }),
        }
    }
}

/// Launcher that forks, execs through `PATH` and reaps each child before returning.
pub struct ForkExecLauncher {
    diagnostic_prefix: CString,
    last_termination: Option<Termination>,
}

impl ForkExecLauncher {
    pub fn new(config: &ShellConfig) -> Self {
        let diagnostic_prefix = CString::new(config.diagnostic_prefix.replace('\0', ""))
            .unwrap_or_default();
        Self {
            diagnostic_prefix,
            last_termination: None,
        }
    }

    /// How the most recently reaped child ended.
    pub fn last_termination(&self) -> Option<Termination> {
        self.last_termination
    }

    fn run(&mut self, argv: &[&str]) -> Result<Termination> {
        let command = ExternalCommand::new(argv)?;
        let pid = command.spawn(&self.diagnostic_prefix)?;
        debug!(%pid, program = argv[0], "spawned child");

        let termination = wait_for_termination(pid)?;
        debug!(%pid, ?termination, code = termination.code(), "reaped child");
        self.last_termination = Some(termination);
        Ok(termination)
    }
}

impl Launcher for ForkExecLauncher {
    fn launch(&mut self, argv: &[&str], streams: &mut Streams<'_>) -> Continuation {
        if let Err(e) = self.run(argv) {
            streams.report(&e);
        }
        Continuation::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::kill;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    fn launch(argv: &[&str]) -> (ForkExecLauncher, Continuation, String) {
        let config = ShellConfig::default();
        let mut launcher = ForkExecLauncher::new(&config);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let continuation = launcher.launch(
            argv,
            &mut Streams {
                out: &mut out,
                err: &mut err,
                config: &config,
            },
        );
        (launcher, continuation, String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_from_status_only_accepts_true_termination() {
        let pid = Pid::from_raw(4242);
        assert_eq!(
            Termination::from_status(WaitStatus::Exited(pid, 3)),
            Some(Termination::Exited(3))
        );
        assert_eq!(
            Termination::from_status(WaitStatus::Signaled(pid, Signal::SIGKILL, false)),
            Some(Termination::Signaled(Signal::SIGKILL))
        );
        assert_eq!(
            Termination::from_status(WaitStatus::Stopped(pid, Signal::SIGTSTP)),
            None
        );
        assert_eq!(Termination::from_status(WaitStatus::Continued(pid)), None);
        assert_eq!(Termination::from_status(WaitStatus::StillAlive), None);
    }

    #[test]
    fn test_termination_code() {
        assert_eq!(Termination::Exited(0).code(), 0);
        assert_eq!(Termination::Exited(7).code(), 7);
        assert_eq!(Termination::Signaled(Signal::SIGTERM).code(), 143);
    }

    #[test]
    fn test_successful_program_is_reaped() {
        let (launcher, continuation, err) = launch(&["true"]);
        assert_eq!(continuation, Continuation::Continue);
        assert_eq!(launcher.last_termination(), Some(Termination::Exited(0)));
        assert!(err.is_empty());
    }

    #[test]
    fn test_failing_program_still_continues() {
        let (launcher, continuation, _) = launch(&["sh", "-c", "exit 3"]);
        assert_eq!(continuation, Continuation::Continue);
        assert_eq!(launcher.last_termination(), Some(Termination::Exited(3)));
    }

    #[test]
    fn test_signaled_program_is_reaped() {
        let (launcher, continuation, _) = launch(&["sh", "-c", "kill -TERM $$"]);
        assert_eq!(continuation, Continuation::Continue);
        assert_eq!(
            launcher.last_termination(),
            Some(Termination::Signaled(Signal::SIGTERM))
        );
    }

    #[test]
    fn test_argv0_is_passed_to_the_program() {
        // `$0` of `sh -c` is the first operand after the script.
        let (launcher, _, _) = launch(&["sh", "-c", "test \"$0 $1\" = \"x y\"", "x", "y"]);
        assert_eq!(launcher.last_termination(), Some(Termination::Exited(0)));
    }

    #[test]
    fn test_missing_program_exits_child_with_failure() {
        let (launcher, continuation, err) = launch(&["definitely-not-a-real-program-5f3a"]);
        assert_eq!(continuation, Continuation::Continue);
        // The child reports on the inherited stderr, not through `streams`.
        assert!(err.is_empty());
        assert_eq!(
            launcher.last_termination(),
            Some(Termination::Exited(EXIT_FAILURE))
        );
    }

    #[test]
    fn test_argument_vector_is_null_terminated() {
        let command = ExternalCommand::new(&["ls", "-la"]).unwrap();
        assert_eq!(command.argv_ptrs.len(), 3);
        assert_eq!(command.argv_ptrs[0], command.argv[0].as_ptr());
        assert_eq!(command.argv_ptrs[1], command.argv[1].as_ptr());
        assert!(command.argv_ptrs[2].is_null());
        assert_eq!(command.program.as_c_str(), c"ls");
    }

    #[test]
    fn test_nul_byte_is_reported_without_forking() {
        let (launcher, continuation, err) = launch(&["ec\0ho", "hi"]);
        assert_eq!(continuation, Continuation::Continue);
        assert_eq!(launcher.last_termination(), None);
        assert!(err.starts_with("creepy_shell: "), "got: {err}");
        assert!(err.contains("nul byte"));
    }

    #[test]
    fn test_stopped_child_is_waited_until_it_exits() {
        let command = ExternalCommand::new(&["sh", "-c", "kill -STOP $$; exit 7"]).unwrap();
        let pid = command.spawn(c"creepy_shell").unwrap();

        let reaped = Arc::new(AtomicBool::new(false));
        let resumer = {
            let reaped = Arc::clone(&reaped);
            thread::spawn(move || {
                while !reaped.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(50));
                    let _ = kill(pid, Signal::SIGCONT);
                }
            })
        };

        let termination = wait_for_termination(pid);
        reaped.store(true, Ordering::SeqCst);
        resumer.join().unwrap();

        assert_eq!(termination.unwrap(), Termination::Exited(7));
    }

    #[test]
    fn test_waiting_for_an_unknown_child_is_an_error() {
        // pid 1 is never our child
        let err = wait_for_termination(Pid::from_raw(1)).unwrap_err();
        assert!(matches!(err, ShellError::Wait { errno: Errno::ECHILD, .. }));
    }
}
