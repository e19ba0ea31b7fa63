use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Destructive operations require the exact keyword (e.g. "DELETE") typed at
/// the terminal. Anything else aborts with no mutation. `--yes` on the
/// command line bypasses the prompt for scripted runs.
pub fn confirm_typed(question: &str, keyword: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{} Type '{}' to proceed: ", question, keyword);
    io::stdout().flush()?;
    let answer = read_line()?;
    Ok(keyword_matches(&answer, keyword))
}

// the keyword must be typed exactly; "delete" is not "DELETE"
fn keyword_matches(answer: &str, keyword: &str) -> bool {
    answer.trim() == keyword
}

/// Plain yes/no confirmation for non-destructive mutations.
pub fn confirm_yes(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{} (Y/N): ", question);
    io::stdout().flush()?;
    let answer = read_line()?;
    Ok(matches!(answer.trim().to_ascii_uppercase().as_str(), "Y" | "YES"))
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_must_match_exactly() {
        assert!(keyword_matches("DELETE\n", "DELETE"));
        assert!(keyword_matches("  RECYCLE  ", "RECYCLE"));
        assert!(!keyword_matches("delete", "DELETE"));
        assert!(!keyword_matches("Delete", "DELETE"));
        assert!(!keyword_matches("", "DELETE"));
    }
}
