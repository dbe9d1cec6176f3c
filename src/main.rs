use anyhow::Context;
use creepy_shell::{EditorLines, Interpreter, ShellConfig, logging};

fn main() -> anyhow::Result<()> {
    logging::init_stderr_logging();

    let config = ShellConfig::default();
    let mut lines = EditorLines::new(config.history).context("cannot open the line editor")?;
    Interpreter::with_config(config).repl(&mut lines)
}
