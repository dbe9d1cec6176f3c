/// Presentation settings of an [`Interpreter`](crate::Interpreter).
///
/// Nothing is loaded from disk or the command line; embedders override the
/// defaults by constructing the struct directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Display name used by `help` and `exit`.
    pub name: String,
    /// Prefix of every diagnostic written to the error stream.
    pub diagnostic_prefix: String,
    /// Prompt shown by the line source before each read.
    pub prompt: String,
    /// Whether the interactive editor records entered lines.
    pub history: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            name: "CreepyShell".to_string(),
            diagnostic_prefix: "creepy_shell".to_string(),
            prompt: "> ".to_string(),
            history: true,
        }
    }
}
