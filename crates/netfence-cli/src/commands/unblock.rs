use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use blocker::Selection;

use super::{explain, GlobalOptions};

pub fn execute(options: &GlobalOptions, selection: &str, assume_yes: bool) -> Result<()> {
    let mut blocker = options.open_blocker()?;
    let selection = Selection::parse(selection);
    let index = blocker.resolve(&selection).map_err(explain)?;
    let path = blocker.items()[index].path.clone();

    if !assume_yes && !confirm(&format!("Are you sure you want to unblock:\n{}", path.display()))? {
        println!("Unblock cancelled.");
        return Ok(());
    }

    let outcome = blocker
        .unblock(&Selection::Position(index + 1))
        .map_err(explain)?;
    println!("✓ {}", outcome.summary());
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(anyhow::anyhow!(
            "refusing to unblock without confirmation (pass --yes when not on a terminal)"
        ));
    }
    print!("{question}\nProceed? [y/N] ");
    io::stdout().flush().context("flush prompt")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("read confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
