use crate::command::{Continuation, Streams};
use crate::error::ShellError;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are described with the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process. Their operands are handed over
/// untouched instead of being parsed as options.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Executes the command. `operands` are `argv[1..]`, verbatim: a leading
    /// `-` or the word `help` carries no special meaning.
    ///
    /// An `Err` is reported as a diagnostic by the caller and the loop continues.
    fn execute(
        self,
        operands: &[&str],
        streams: &mut Streams<'_>,
    ) -> Result<Continuation, ShellError>;
}

/// The registry of built-in commands.
///
/// Lookup is by exact, case-sensitive name; [`Builtin::ALL`] fixes the order
/// in which `help` lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Help,
    Exit,
}

impl Builtin {
    pub const ALL: [Builtin; 3] = [Builtin::Cd, Builtin::Help, Builtin::Exit];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => Cd::name(),
            Builtin::Help => Help::name(),
            Builtin::Exit => Exit::name(),
        }
    }

    pub fn lookup(name: &str) -> Option<Builtin> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Parses `argv` for this builtin and runs it. `argv[0]` is the builtin's own name.
    pub fn invoke(self, argv: &[&str], streams: &mut Streams<'_>) -> Continuation {
        let continuation = match self {
            Builtin::Cd => run::<Cd>(argv, streams),
            Builtin::Help => run::<Help>(argv, streams),
            Builtin::Exit => run::<Exit>(argv, streams),
        };
        if let Err(e) = streams.out.flush() {
            tracing::warn!(error = %e, "could not flush builtin output");
        }
        continuation
    }
}

fn run<T: BuiltinCommand>(argv: &[&str], streams: &mut Streams<'_>) -> Continuation {
    let operands = argv.get(1..).unwrap_or_default();
    // Operands never go through the option parser, so `cd -x` and `exit --help`
    // keep their plain meaning.
    match T::from_args(&[T::name()], &[]) {
        Ok(cmd) => match cmd.execute(operands, streams) {
            Ok(continuation) => continuation,
            Err(e) => {
                streams.report(&e);
                Continuation::Continue
            }
        },
        Err(EarlyExit { output, .. }) => {
            streams.report(&output.trim_end());
            Continuation::Continue
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// Takes the target directory as its first operand; extra operands are ignored.
pub struct Cd {}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        operands: &[&str],
        _streams: &mut Streams<'_>,
    ) -> Result<Continuation, ShellError> {
        let Some(&target) = operands.first() else {
            return Err(ShellError::MissingArgument {
                command: Self::name(),
            });
        };

        env::set_current_dir(target).map_err(|source| ShellError::ChangeDirectory {
            path: target.to_string(),
            source,
        })?;
        Ok(Continuation::Continue)
    }
}

#[derive(FromArgs)]
/// Show how to use the shell and list the builtin commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(
        self,
        _operands: &[&str],
        streams: &mut Streams<'_>,
    ) -> Result<Continuation, ShellError> {
        if let Err(e) = write_usage(streams.out, &streams.config.name) {
            tracing::warn!(error = %e, "could not write help");
        }
        Ok(Continuation::Continue)
    }
}

fn write_usage(out: &mut dyn Write, shell_name: &str) -> std::io::Result<()> {
    writeln!(out, "{shell_name}")?;
    writeln!(out, "Write program names and arguments, and hit enter.")?;
    writeln!(out, "The following are builtin commands:")?;
    for builtin in Builtin::ALL {
        writeln!(out, "  {}", builtin.name())?;
    }
    writeln!(out, "Use the man command for information on other programs.")
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _operands: &[&str],
        streams: &mut Streams<'_>,
    ) -> Result<Continuation, ShellError> {
        if let Err(e) = writeln!(streams.out, "{} say to you Bye :D", streams.config.name) {
            tracing::warn!(error = %e, "could not write farewell");
        }
        Ok(Continuation::Terminate)
    }
}
