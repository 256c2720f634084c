//! Confirmation prompts.

use anyhow::{Context, Result};

use super::RealRuntime;

use std::io::{self, BufRead, Write};

/// Only an explicit `y` or `yes` (any case) counts as consent.
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Write `prompt` to `output`, then read one answer line from `input`.
pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation answer")?;
    Ok(is_yes(&answer))
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str) -> Result<bool> {
        confirm_with_io(prompt, &mut io::stdin().lock(), &mut io::stdout())
    }
}
