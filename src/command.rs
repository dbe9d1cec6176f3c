use crate::config::ShellConfig;
use std::fmt::Display;
use std::io::Write;

/// Outcome of one dispatched command: keep reading lines or stop.
///
/// Mirrors the conventional integer signal where nonzero means "continue"
/// and zero means "terminate"; see the `From` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Continue,
    Terminate,
}

impl Continuation {
    pub fn is_continue(self) -> bool {
        self == Continuation::Continue
    }
}

impl From<Continuation> for i32 {
    fn from(value: Continuation) -> Self {
        match value {
            Continuation::Continue => 1,
            Continuation::Terminate => 0,
        }
    }
}

/// Output and error streams handed to a command, plus the settings used to
/// format what it writes.
pub struct Streams<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    pub config: &'a ShellConfig,
}

impl Streams<'_> {
    /// Writes `<prefix>: <error>` to the error stream.
    pub fn report(&mut self, error: &dyn Display) {
        let written = writeln!(self.err, "{}: {}", self.config.diagnostic_prefix, error)
            .and_then(|()| self.err.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "could not write diagnostic");
        }
    }
}

/// Runs commands that are not built into the interpreter.
///
/// Implementations must not return before the program they started has
/// terminated, and must report every failure through `streams`.
pub trait Launcher {
    /// Runs `argv[0]` with `argv` as its full argument vector.
    ///
    /// `argv` is never empty. External programs cannot stop the interpreter,
    /// so implementations return [`Continuation::Continue`].
    fn launch(&mut self, argv: &[&str], streams: &mut Streams<'_>) -> Continuation;
}
