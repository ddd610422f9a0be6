use anyhow::Result;

use blocker::BlockOutcome;

use super::{explain, GlobalOptions};

pub fn execute(options: &GlobalOptions, path: &str, folder: bool) -> Result<()> {
    let mut blocker = options.open_blocker()?;
    let outcome = blocker.block(path, folder).map_err(explain)?;
    match &outcome {
        BlockOutcome::Blocked { .. } => println!("✓ {}", outcome.summary()),
        BlockOutcome::NothingToBlock { .. } => println!("{}", outcome.summary()),
    }
    Ok(())
}
