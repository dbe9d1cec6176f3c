use crate::builtin::Builtin;
use crate::command::{Continuation, Launcher, Streams};
use crate::config::ShellConfig;
use crate::external::ForkExecLauncher;
use crate::io_adapters::LineSource;
use crate::lexer;
use anyhow::Context;
use std::io::Write;
use tracing::debug;

/// A minimal shell-like interpreter that runs builtins in-process and hands
/// every other command to a [`Launcher`].
///
/// Example
/// ```
/// use creepy_shell::{Continuation, Interpreter};
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.execute(&[]), Continuation::Continue);
/// ```
pub struct Interpreter {
    config: ShellConfig,
    launcher: Box<dyn Launcher>,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Interpreter {
    /// Create a new interpreter with a custom launcher and output streams.
    pub fn new(
        config: ShellConfig,
        launcher: Box<dyn Launcher>,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        Self {
            config,
            launcher,
            stdout,
            stderr,
        }
    }

    /// Interpreter writing to the process' own streams and launching real programs.
    pub fn with_config(config: ShellConfig) -> Self {
        let launcher = Box::new(ForkExecLauncher::new(&config));
        Self::new(
            config,
            launcher,
            Box::new(std::io::stdout()),
            Box::new(std::io::stderr()),
        )
    }

    /// Dispatches one argument vector.
    ///
    /// An empty vector is a no-op. A builtin name always wins over a program
    /// of the same name on `PATH`.
    pub fn execute(&mut self, argv: &[&str]) -> Continuation {
        let Some(&name) = argv.first() else {
            return Continuation::Continue;
        };

        let mut streams = Streams {
            out: &mut *self.stdout,
            err: &mut *self.stderr,
            config: &self.config,
        };
        match Builtin::lookup(name) {
            Some(builtin) => {
                debug!(?builtin, "running builtin");
                builtin.invoke(argv, &mut streams)
            }
            None => self.launcher.launch(argv, &mut streams),
        }
    }

    /// Tokenizes and executes one line.
    ///
    /// Fails only when the token list cannot be allocated.
    pub fn run_line(&mut self, line: &str) -> anyhow::Result<Continuation> {
        let argv = lexer::split_into_tokens(line)
            .with_context(|| format!("{}: cannot tokenize line", self.config.diagnostic_prefix))?;
        debug!(argv = ?argv.as_slice(), "tokenized line");
        Ok(self.execute(argv.as_slice()))
    }

    /// Read-eval loop: runs lines from `lines` until `exit` or end of input.
    ///
    /// Returns an error only for failures the loop cannot recover from:
    /// the line source breaking or the tokenizer running out of memory.
    pub fn repl(&mut self, lines: &mut dyn LineSource) -> anyhow::Result<()> {
        loop {
            let Some(line) = lines
                .read_line(&self.config.prompt)
                .with_context(|| format!("{}: cannot read input", self.config.diagnostic_prefix))?
            else {
                debug!("end of input");
                return Ok(());
            };

            if self.run_line(&line)? == Continuation::Terminate {
                return Ok(());
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::with_config(ShellConfig::default())
    }
}
