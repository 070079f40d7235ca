//! Terminal prompts and notices for the `pagenotes` binary.

use std::io::{BufRead, Write};

use crate::interaction::{Interaction, Notice};

/// Confirms on stdin and prints notices to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalInteraction {
    assume_yes: bool,
}

impl TerminalInteraction {
    /// Create a terminal interaction. With `assume_yes`, every
    /// confirmation is accepted without prompting.
    #[must_use]
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Interaction for TerminalInteraction {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        let mut stderr = std::io::stderr();
        if write!(stderr, "{prompt} [y/N] ").and_then(|()| stderr.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        parse_answer(&answer)
    }

    fn notify(&self, notice: Notice) {
        eprintln!("{notice}");
    }
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n"));
        assert!(parse_answer(" YES "));
        assert!(!parse_answer("\n"));
        assert!(!parse_answer("no"));
        assert!(!parse_answer("yep"));
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(TerminalInteraction::new(true).confirm("Delete?"));
    }
}
