//! Interactive prompts.
//!
//! [`Confirm`] gates each create, update, and upload when the user asks for
//! confirmation; otherwise [`AutoApprove`] answers yes to everything.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};

pub trait Confirm: Send + Sync {
    fn confirm(&self, question: &str) -> Result<bool>;
}

pub struct AutoApprove;

impl Confirm for AutoApprove {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Asks on stdout and reads one answer from stdin. Only `y` or `Y` approves;
/// end of input declines.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        let answer = ask(question)?;
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}

/// Pick the confirmation gate for this run.
pub fn confirmer(confirm: bool) -> Result<Box<dyn Confirm>> {
    if !confirm {
        return Ok(Box::new(AutoApprove));
    }
    if !atty::is(atty::Stream::Stdin) {
        bail!("--confirm needs an interactive terminal on stdin");
    }
    Ok(Box::new(StdinConfirm))
}

/// Print `prompt` and read one trimmed line from stdin.
pub fn ask(prompt: &str) -> Result<String> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;
    drop(stdout);

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Keep asking until the answer is an http(s) URL. Trailing slashes are
/// removed.
pub fn ask_url(prompt: &str) -> Result<String> {
    loop {
        let input = ask(prompt)?;
        if input.is_empty() {
            bail!("No URL entered");
        }
        let input = input.trim_end_matches('/').to_string();
        match url::Url::parse(&input) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => return Ok(input),
            _ => tracing::warn!("Error with URL. Be sure to include the http:// prefix"),
        }
    }
}
