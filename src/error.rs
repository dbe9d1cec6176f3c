//! Error types for the interpreter.
//!
//! Every recoverable variant is reported to the operator as a one-line
//! diagnostic and the loop continues. [`ShellError::Lexing`] and
//! [`ShellError::ReadLine`] are fatal and end the process.

use crate::lexer::LexingError;
use nix::errno::Errno;
use nix::unistd::Pid;
use rustyline::error::ReadlineError;
use thiserror::Error;

/// Main error type for interpreter operations.
#[derive(Error, Debug)]
pub enum ShellError {
    /// A built-in was invoked without an operand it requires.
    #[error("expected argument to \"{command}\"")]
    MissingArgument { command: &'static str },

    /// `chdir` rejected the requested directory.
    #[error("cd: {path}: {source}")]
    ChangeDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A token cannot be handed to `execvp` because it contains a NUL byte.
    #[error("{argument:?}: argument contains a nul byte")]
    InvalidArgument { argument: String },

    /// The kernel refused to create a child process.
    #[error("fork: {}", .0.desc())]
    Fork(Errno),

    /// Waiting for a spawned child failed for a reason other than `EINTR`.
    #[error("wait for process {pid}: {}", .errno.desc())]
    Wait { pid: Pid, errno: Errno },

    #[error("failed to read line: {0}")]
    ReadLine(#[from] ReadlineError),

    #[error(transparent)]
    Lexing(#[from] LexingError),
}

/// Result type alias using ShellError.
pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_argument_display() {
        let err = ShellError::MissingArgument { command: "cd" };
        assert_eq!(err.to_string(), "expected argument to \"cd\"");
    }

    #[test]
    fn test_change_directory_display_includes_path_and_cause() {
        let err = ShellError::ChangeDirectory {
            path: "/nope".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("cd: /nope: "), "unexpected message: {msg}");
    }

    #[test]
    fn test_fork_display_uses_errno_description() {
        let err = ShellError::Fork(Errno::EAGAIN);
        assert_eq!(err.to_string(), format!("fork: {}", Errno::EAGAIN.desc()));
    }

    #[test]
    fn test_lexing_error_is_transparent() {
        let mut v: Vec<u8> = Vec::new();
        let reserve = v.try_reserve(usize::MAX).unwrap_err();
        let err = ShellError::from(LexingError::from(reserve));
        assert!(err.to_string().starts_with("allocation error: "));
    }
}
