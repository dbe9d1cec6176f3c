//! A minimal interactive command interpreter.
//!
//! Each line read from a [`LineSource`] is split into an argument vector,
//! then either run as one of the builtins (`cd`, `help`, `exit`) or handed to
//! a [`Launcher`], which by default forks, execs the program through `PATH`
//! and reaps the child before the next line is read.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the
//! pieces for embedding it with other streams, launchers or line sources.

pub mod builtin;
pub mod command;
pub mod config;
pub mod error;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod logging;

pub use command::{Continuation, Launcher, Streams};
pub use config::ShellConfig;
pub use error::ShellError;
pub use interpreter::Interpreter;
pub use io_adapters::{EditorLines, LineSource, ScriptedLines};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Serializes tests that read or change the process working directory.
    pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
