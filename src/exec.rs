use anyhow::{bail, Context as _, Result};
use std::process::Command;

/// Run a rendered command line as a foreground child process and hand its
/// exit code back. The command string is split on spaces, as rendered;
/// arguments with embedded whitespace are not a thing this program emits.
pub fn run(command: &str) -> Result<i32> {
    let mut parts = command.split(' ').filter(|s| !s.is_empty());
    let Some(program) = parts.next() else {
        bail!("empty command");
    };

    let status = Command::new(program)
        .args(parts)
        .status()
        .with_context(|| format!("failed to run '{command}'"))?;

    // Killed by a signal on unix: no code. Report plain failure.
    Ok(status.code().unwrap_or(1))
}

/// Fire-and-forget spawn (the config-editor path). Only a failed spawn is
/// an error; the child's fate is its own.
pub fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
    Command::new(program)
        .args(args)
        .spawn()
        .with_context(|| format!("failed to start '{program}'"))?;
    Ok(())
}
