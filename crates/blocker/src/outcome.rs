use std::path::{Path, PathBuf};

use netfence_core::types::BlockedItem;

#[derive(Debug, Clone)]
pub enum BlockOutcome {
    /// Every target received its rule pair and the item was recorded.
    Blocked {
        item: BlockedItem,
        targets: usize,
        skipped: usize,
    },
    /// A folder held no executables; nothing was applied or recorded.
    NothingToBlock { path: PathBuf, skipped: usize },
}

#[derive(Debug, Clone)]
pub struct UnblockOutcome {
    pub item: BlockedItem,
    pub targets: usize,
    pub rules_removed: usize,
    /// Locations the re-expansion could not read; their executables were not visited.
    pub skipped: usize,
}

impl BlockOutcome {
    pub fn targets(&self) -> usize {
        match self {
            BlockOutcome::Blocked { targets, .. } => *targets,
            BlockOutcome::NothingToBlock { .. } => 0,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            BlockOutcome::Blocked {
                item,
                targets,
                skipped,
            } => {
                let mut line = format!(
                    "Blocked {targets} application(s): {}",
                    display_name(&item.path)
                );
                if *skipped > 0 {
                    line.push_str(&format!(" ({skipped} unreadable location(s) skipped)"));
                }
                line
            }
            BlockOutcome::NothingToBlock { path, .. } => format!(
                "No executable files found in {}; nothing was blocked.",
                path.display()
            ),
        }
    }
}

impl UnblockOutcome {
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Unblocked {} application(s) ({} rule(s) removed): {}",
            self.targets,
            self.rules_removed,
            display_name(&self.item.path)
        );
        if self.skipped > 0 {
            line.push_str(&format!(
                " ({} unreadable location(s) skipped; rules for executables there may remain)",
                self.skipped
            ));
        }
        line
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_summary() {
        let outcome = BlockOutcome::Blocked {
            item: BlockedItem::new(PathBuf::from("/games/Arcade"), true),
            targets: 3,
            skipped: 1,
        };
        assert_eq!(
            outcome.summary(),
            "Blocked 3 application(s): Arcade (1 unreadable location(s) skipped)"
        );
        assert_eq!(outcome.targets(), 3);
    }

    #[test]
    fn test_unblock_summary_mentions_skipped_locations() {
        let mut outcome = UnblockOutcome {
            item: BlockedItem::new(PathBuf::from("/games/Arcade"), true),
            targets: 2,
            rules_removed: 4,
            skipped: 0,
        };
        assert_eq!(
            outcome.summary(),
            "Unblocked 2 application(s) (4 rule(s) removed): Arcade"
        );
        outcome.skipped = 1;
        assert!(outcome
            .summary()
            .ends_with("(1 unreadable location(s) skipped; rules for executables there may remain)"));
    }

    #[test]
    fn test_nothing_to_block_summary() {
        let outcome = BlockOutcome::NothingToBlock {
            path: PathBuf::from("/empty"),
            skipped: 0,
        };
        assert!(outcome.summary().starts_with("No executable files found"));
        assert_eq!(outcome.targets(), 0);
    }
}
