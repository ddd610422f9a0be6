use std::path::{Path, PathBuf};

use tracing::{info, warn};

use firewall::FirewallControl;
use netfence_core::config::Config;
use netfence_core::error::{BlockError, ControlError};
use netfence_core::ids::RuleNames;
use netfence_core::paths::{absolute_from, clean_declared_path};
use netfence_core::store::BlockStore;
use netfence_core::types::{BlockedItem, Direction};

pub mod expand;
pub mod outcome;

pub use expand::{expand, Expansion, ExpansionError};
pub use outcome::{BlockOutcome, UnblockOutcome};

/// How the operator points at an existing declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// 1-based position as shown by `list`.
    Position(usize),
    Path(PathBuf),
}

impl Selection {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<usize>() {
            Ok(position) => Selection::Position(position),
            Err(_) => Selection::Path(PathBuf::from(trimmed)),
        }
    }
}

/// Keeps firewall rules in step with the declared-intent store.
///
/// An item is recorded only after every target got both rules, and removed only
/// after every target's rules were deleted. Control failures abort the batch
/// without touching the store; rules applied before the failure stay in place.
pub struct Blocker<F> {
    firewall: F,
    store: BlockStore,
    rule_prefix: String,
    extensions: Vec<String>,
    base_dir: Option<PathBuf>,
}

impl<F: FirewallControl> Blocker<F> {
    pub fn new(firewall: F, store: BlockStore, config: &Config) -> Self {
        Self {
            firewall,
            store,
            rule_prefix: config.firewall.rule_prefix.clone(),
            extensions: config.scan.executable_extensions.clone(),
            base_dir: None,
        }
    }

    /// Anchors relative declarations at `dir` instead of the process working directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn items(&self) -> &[BlockedItem] {
        self.store.items()
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn firewall(&self) -> &F {
        &self.firewall
    }

    pub fn block(&mut self, raw_path: &str, is_folder: bool) -> Result<BlockOutcome, BlockError> {
        let path = clean_declared_path(raw_path)
            .ok_or_else(|| BlockError::Validation("enter a file or folder path".to_string()))?;
        let path = self.absolute(&path)?;

        if is_folder && !path.is_dir() {
            return Err(BlockError::NotFound {
                path,
                kind: "folder",
            });
        }
        if !is_folder && !path.is_file() {
            return Err(BlockError::NotFound { path, kind: "file" });
        }
        if self.store.contains(&path) {
            return Err(BlockError::Duplicate(path));
        }

        let expansion = expand(&path, is_folder, &self.extensions);
        let skipped = expansion.skipped.len();
        if expansion.targets.is_empty() {
            info!(path = %path.display(), "no executables under folder, nothing recorded");
            return Ok(BlockOutcome::NothingToBlock { path, skipped });
        }

        for target in &expansion.targets {
            if let Err(err) = self.apply_rule_pair(target) {
                warn!(
                    path = %path.display(),
                    target = %target.display(),
                    error = %err,
                    "block aborted, earlier rules in this batch remain applied"
                );
                return Err(err.into());
            }
        }

        let item = BlockedItem::new(path, is_folder);
        self.store.add(item.clone())?;
        info!(path = %item.path.display(), targets = expansion.targets.len(), "blocked");
        Ok(BlockOutcome::Blocked {
            item,
            targets: expansion.targets.len(),
            skipped,
        })
    }

    pub fn unblock(&mut self, selection: &Selection) -> Result<UnblockOutcome, BlockError> {
        let index = self.resolve(selection)?;
        let item = self.store.items()[index].clone();

        // Folders are re-expanded: whatever lives there now is what gets unblocked.
        let Expansion { targets, skipped } = expand(&item.path, item.is_folder, &self.extensions);
        if !skipped.is_empty() {
            warn!(
                path = %item.path.display(),
                skipped = skipped.len(),
                "unreadable locations during unblock, rules for executables there may remain"
            );
        }
        let mut rules_removed = 0;
        for target in &targets {
            match self.firewall.delete_rules_by_program(target) {
                Ok(removed) => rules_removed += removed,
                Err(err) => {
                    warn!(
                        path = %item.path.display(),
                        target = %target.display(),
                        error = %err,
                        "unblock aborted, item kept"
                    );
                    return Err(err.into());
                }
            }
        }

        self.store.remove(index)?;
        info!(
            path = %item.path.display(),
            targets = targets.len(),
            rules_removed,
            skipped = skipped.len(),
            "unblocked"
        );
        Ok(UnblockOutcome {
            item,
            targets: targets.len(),
            rules_removed,
            skipped: skipped.len(),
        })
    }

    /// Finds the store index for a selection.
    pub fn resolve(&self, selection: &Selection) -> Result<usize, BlockError> {
        match selection {
            Selection::Position(position) => {
                if *position == 0 || *position > self.store.len() {
                    return Err(BlockError::NotBlocked(format!(
                        "no entry at position {position}"
                    )));
                }
                Ok(position - 1)
            }
            Selection::Path(path) => {
                let path = self.absolute(path)?;
                self.store
                    .position(&path)
                    .ok_or_else(|| BlockError::NotBlocked(path.display().to_string()))
            }
        }
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf, BlockError> {
        if path.is_absolute() {
            return Ok(absolute_from(path, Path::new("")));
        }
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|err| {
                BlockError::Validation(format!(
                    "cannot resolve relative path {}: {err}",
                    path.display()
                ))
            })?,
        };
        Ok(absolute_from(path, &base))
    }

    fn apply_rule_pair(&mut self, target: &Path) -> Result<(), ControlError> {
        let names = RuleNames::generate(&self.rule_prefix, target);
        for direction in [Direction::Out, Direction::In] {
            self.firewall
                .add_block_rule(direction, names.for_direction(direction), target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use firewall::{FirewallCall, MemoryFirewall};
    use netfence_core::paths::PATH_PLACEHOLDER;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn state_path(&self) -> PathBuf {
            self.root().join("state/blocked_items.json")
        }

        fn file(&self, relative: &str) -> PathBuf {
            let path = self.root().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"MZ").unwrap();
            path
        }

        fn folder(&self, relative: &str) -> PathBuf {
            let path = self.root().join(relative);
            fs::create_dir_all(&path).unwrap();
            path
        }

        fn blocker(&self, firewall: MemoryFirewall) -> Blocker<MemoryFirewall> {
            let store = BlockStore::load(&self.state_path()).unwrap();
            Blocker::new(firewall, store, &Config::default_config())
        }

        fn persisted(&self) -> Vec<BlockedItem> {
            BlockStore::load(&self.state_path()).unwrap().items().to_vec()
        }
    }

    fn as_str(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    fn add_calls(firewall: &MemoryFirewall) -> Vec<(Direction, PathBuf)> {
        firewall
            .calls()
            .iter()
            .filter_map(|call| match call {
                FirewallCall::Add {
                    direction, program, ..
                } => Some((*direction, program.clone())),
                _ => None,
            })
            .collect()
    }

    fn delete_calls(firewall: &MemoryFirewall) -> Vec<PathBuf> {
        firewall
            .calls()
            .iter()
            .filter_map(|call| match call {
                FirewallCall::DeleteByProgram { program } => Some(program.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_block_file_applies_rule_pair_and_records() {
        let fixture = Fixture::new();
        let app = fixture.file("apps/game.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());

        let outcome = blocker.block(as_str(&app), false).unwrap();
        assert_eq!(outcome.targets(), 1);
        assert_eq!(
            add_calls(blocker.firewall()),
            vec![(Direction::Out, app.clone()), (Direction::In, app.clone())]
        );
        let names: Vec<&str> = blocker
            .firewall()
            .rules()
            .iter()
            .map(|rule| rule.name.as_str())
            .collect();
        assert!(names[0].starts_with("BlockApp_game.exe_"));
        assert_eq!(names[1], format!("{}_In", names[0]));

        let persisted = fixture.persisted();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].path, app);
        assert!(!persisted[0].is_folder);
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let fixture = Fixture::new();
        let app = fixture.file("apps/Game.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        blocker.block(as_str(&app), false).unwrap();

        let err = blocker.block(as_str(&app), false).unwrap_err();
        assert!(matches!(err, BlockError::Duplicate(_)));
        assert_eq!(blocker.items().len(), 1);
        assert_eq!(fixture.persisted().len(), 1);
        assert_eq!(blocker.firewall().calls().len(), 2);
    }

    #[test]
    fn test_duplicate_check_ignores_case_and_trailing_separator() {
        let fixture = Fixture::new();
        let folder = fixture.folder("Games");
        fixture.file("Games/a.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        blocker.block(as_str(&folder), true).unwrap();

        assert!(blocker.store().contains(&PathBuf::from(as_str(&folder).to_lowercase())));
        let err = blocker
            .block(&format!("  {}/ ", as_str(&folder)), true)
            .unwrap_err();
        assert!(matches!(err, BlockError::Duplicate(_)));
    }

    #[test]
    fn test_file_inside_blocked_folder_is_allowed() {
        let fixture = Fixture::new();
        let folder = fixture.folder("suite");
        let inner = fixture.file("suite/inner.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        blocker.block(as_str(&folder), true).unwrap();
        blocker.block(as_str(&inner), false).unwrap();
        assert_eq!(blocker.items().len(), 2);
    }

    #[test]
    fn test_block_then_unblock_restores_state() {
        let fixture = Fixture::new();
        let existing = fixture.file("keep/old.exe");
        let app = fixture.file("apps/tool.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        blocker.block(as_str(&existing), false).unwrap();
        let before = fixture.persisted();

        blocker.block(as_str(&app), false).unwrap();
        let outcome = blocker.unblock(&Selection::Path(app.clone())).unwrap();

        assert_eq!(outcome.targets, 1);
        assert_eq!(outcome.rules_removed, 2);
        assert_eq!(fixture.persisted(), before);
        assert_eq!(blocker.items(), before.as_slice());
        assert!(blocker.firewall().rules_for(&app).is_empty());
        assert_eq!(blocker.firewall().rules_for(&existing).len(), 2);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let fixture = Fixture::new();
        let mut blocker = fixture.blocker(MemoryFirewall::new());

        let err = blocker.block("C:\\nope.exe", false).unwrap_err();
        assert!(matches!(err, BlockError::NotFound { kind: "file", .. }));
        let missing = fixture.root().join("nope.exe");
        let err = blocker.block(as_str(&missing), false).unwrap_err();
        assert!(matches!(err, BlockError::NotFound { .. }));

        assert!(blocker.firewall().calls().is_empty());
        assert!(blocker.items().is_empty());
        assert!(!fixture.state_path().exists());
    }

    #[test]
    fn test_kind_mismatch_is_not_found() {
        let fixture = Fixture::new();
        let folder = fixture.folder("dir");
        let app = fixture.file("dir/app.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());

        let err = blocker.block(as_str(&folder), false).unwrap_err();
        assert!(matches!(err, BlockError::NotFound { kind: "file", .. }));
        let err = blocker.block(as_str(&app), true).unwrap_err();
        assert!(matches!(err, BlockError::NotFound { kind: "folder", .. }));
        assert!(blocker.firewall().calls().is_empty());
    }

    #[test]
    fn test_blank_and_placeholder_are_validation_errors() {
        let fixture = Fixture::new();
        let mut blocker = fixture.blocker(MemoryFirewall::new());

        for raw in ["", "   ", PATH_PLACEHOLDER] {
            let err = blocker.block(raw, false).unwrap_err();
            assert!(matches!(err, BlockError::Validation(_)));
            assert!(err.is_input_error());
        }
        assert!(blocker.items().is_empty());
        assert!(blocker.firewall().calls().is_empty());
        assert!(!fixture.state_path().exists());
    }

    #[test]
    fn test_folder_block_creates_pair_per_executable() {
        let fixture = Fixture::new();
        let folder = fixture.folder("suite");
        let a = fixture.file("suite/a.exe");
        let b = fixture.file("suite/bin/b.exe");
        let c = fixture.file("suite/bin/deep/c.EXE");
        fixture.file("suite/notes.txt");
        fixture.file("suite/lib.dll");
        let mut blocker = fixture.blocker(MemoryFirewall::new());

        let outcome = blocker.block(as_str(&folder), true).unwrap();
        assert_eq!(outcome.targets(), 3);

        let adds = add_calls(blocker.firewall());
        assert_eq!(adds.len(), 6);
        assert_eq!(
            adds,
            vec![
                (Direction::Out, a.clone()),
                (Direction::In, a.clone()),
                (Direction::Out, b.clone()),
                (Direction::In, b.clone()),
                (Direction::Out, c.clone()),
                (Direction::In, c.clone()),
            ]
        );
        assert_eq!(blocker.items().len(), 1);
        assert!(blocker.items()[0].is_folder);

        let outcome = blocker.unblock(&Selection::Position(1)).unwrap();
        assert_eq!(outcome.targets, 3);
        assert_eq!(outcome.rules_removed, 6);
        assert_eq!(delete_calls(blocker.firewall()).len(), 3);
        assert!(blocker.firewall().rules().is_empty());
        assert!(fixture.persisted().is_empty());
    }

    #[test]
    fn test_empty_folder_is_not_recorded() {
        let fixture = Fixture::new();
        let folder = fixture.folder("docs");
        fixture.file("docs/readme.txt");
        let mut blocker = fixture.blocker(MemoryFirewall::new());

        let outcome = blocker.block(as_str(&folder), true).unwrap();
        assert!(matches!(outcome, BlockOutcome::NothingToBlock { .. }));
        assert!(blocker.items().is_empty());
        assert!(blocker.firewall().calls().is_empty());
        assert!(!fixture.state_path().exists());
    }

    #[test]
    fn test_control_failure_mid_folder_aborts_without_recording() {
        let fixture = Fixture::new();
        let folder = fixture.folder("suite");
        let first = fixture.file("suite/1.exe");
        let second = fixture.file("suite/2.exe");
        fixture.file("suite/3.exe");
        // Calls 0 and 1 are the first file's pair; call 2 is the second file's outbound rule.
        let mut blocker = fixture.blocker(MemoryFirewall::failing_on_call(2));

        let err = blocker.block(as_str(&folder), true).unwrap_err();
        assert!(matches!(err, BlockError::Control(_)));
        assert!(!err.is_input_error());

        assert_eq!(
            add_calls(blocker.firewall()),
            vec![
                (Direction::Out, first.clone()),
                (Direction::In, first.clone()),
                (Direction::Out, second.clone()),
            ]
        );
        // No rollback: the first file's rules stay.
        assert_eq!(blocker.firewall().rules_for(&first).len(), 2);
        assert!(blocker.items().is_empty());
        assert!(!fixture.state_path().exists());
    }

    #[test]
    fn test_unblock_uses_current_folder_contents() {
        let fixture = Fixture::new();
        let folder = fixture.folder("suite");
        let original = fixture.file("suite/old.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        blocker.block(as_str(&folder), true).unwrap();

        fs::remove_file(&original).unwrap();
        let added = fixture.file("suite/new.exe");

        let outcome = blocker.unblock(&Selection::Path(folder.clone())).unwrap();
        assert_eq!(outcome.targets, 1);
        assert_eq!(delete_calls(blocker.firewall()), vec![added]);
        assert!(blocker.items().is_empty());
    }

    #[test]
    fn test_unblock_stale_file_still_removes_record() {
        let fixture = Fixture::new();
        let app = fixture.file("apps/moved.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        blocker.block(as_str(&app), false).unwrap();
        fs::remove_file(&app).unwrap();

        let outcome = blocker.unblock(&Selection::Path(app.clone())).unwrap();
        assert_eq!(delete_calls(blocker.firewall()), vec![app]);
        assert_eq!(outcome.rules_removed, 2);
        assert!(fixture.persisted().is_empty());
    }

    #[test]
    fn test_unblock_vanished_folder_removes_record_with_zero_deletes() {
        let fixture = Fixture::new();
        let folder = fixture.folder("gone");
        fixture.file("gone/a.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        blocker.block(as_str(&folder), true).unwrap();
        fs::remove_dir_all(&folder).unwrap();

        let outcome = blocker.unblock(&Selection::Position(1)).unwrap();
        assert_eq!(outcome.targets, 0);
        assert_eq!(outcome.rules_removed, 0);
        assert!(delete_calls(blocker.firewall()).is_empty());
        assert!(blocker.items().is_empty());
    }

    #[test]
    fn test_unblock_failure_keeps_item() {
        let fixture = Fixture::new();
        let app = fixture.file("apps/tool.exe");
        // Two adds succeed, the delete (call 2) fails.
        let mut blocker = fixture.blocker(MemoryFirewall::failing_on_call(2));
        blocker.block(as_str(&app), false).unwrap();

        let err = blocker.unblock(&Selection::Path(app.clone())).unwrap_err();
        assert!(matches!(err, BlockError::Control(_)));
        assert_eq!(blocker.items().len(), 1);
        assert_eq!(fixture.persisted().len(), 1);
    }

    #[test]
    fn test_unknown_selection_is_not_blocked() {
        let fixture = Fixture::new();
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        for selection in [
            Selection::Position(0),
            Selection::Position(3),
            Selection::Path(PathBuf::from("/never/declared.exe")),
        ] {
            let err = blocker.unblock(&selection).unwrap_err();
            assert!(matches!(err, BlockError::NotBlocked(_)));
        }
        assert!(blocker.firewall().calls().is_empty());
    }

    #[test]
    fn test_unblock_removes_third_party_rules_for_same_program() {
        let fixture = Fixture::new();
        let app = fixture.file("apps/shared.exe");
        let firewall = MemoryFirewall::new().with_rule(Direction::Out, "SomeoneElse", &app);
        let mut blocker = fixture.blocker(firewall);
        blocker.block(as_str(&app), false).unwrap();

        let outcome = blocker.unblock(&Selection::Position(1)).unwrap();
        assert_eq!(outcome.rules_removed, 3);
        assert!(blocker.firewall().rules().is_empty());
    }

    #[test]
    fn test_relative_declaration_is_stored_absolute() {
        let fixture = Fixture::new();
        let app = fixture.file("game.exe");
        let mut blocker = fixture
            .blocker(MemoryFirewall::new())
            .with_base_dir(fixture.root());

        blocker.block("game.exe", false).unwrap();
        assert_eq!(fixture.persisted()[0].path, app);
        assert_eq!(
            add_calls(blocker.firewall()),
            vec![(Direction::Out, app.clone()), (Direction::In, app.clone())]
        );

        for again in [as_str(&app), "./game.exe"] {
            let err = blocker.block(again, false).unwrap_err();
            assert!(matches!(err, BlockError::Duplicate(ref path) if path == &app));
        }
        assert_eq!(blocker.items().len(), 1);

        let outcome = blocker
            .unblock(&Selection::Path(PathBuf::from("game.exe")))
            .unwrap();
        assert_eq!(outcome.rules_removed, 2);
        assert_eq!(delete_calls(blocker.firewall()), vec![app]);
        assert!(fixture.persisted().is_empty());
    }

    #[test]
    fn test_relative_folder_targets_are_absolute() {
        let fixture = Fixture::new();
        fixture.folder("suite");
        let inner = fixture.file("suite/bin/tool.exe");
        let mut blocker = fixture
            .blocker(MemoryFirewall::new())
            .with_base_dir(fixture.root());

        blocker.block("suite/", true).unwrap();
        assert_eq!(blocker.items()[0].path, fixture.root().join("suite"));
        assert!(blocker
            .firewall()
            .rules()
            .iter()
            .all(|rule| rule.program == inner && rule.program.is_absolute()));
    }

    #[cfg(unix)]
    #[test]
    fn test_unblock_reports_unreadable_subfolder() {
        use std::os::unix::fs::PermissionsExt;

        let fixture = Fixture::new();
        let folder = fixture.folder("suite");
        fixture.file("suite/a.exe");
        let hidden = fixture.file("suite/locked/b.exe");
        let mut blocker = fixture.blocker(MemoryFirewall::new());
        blocker.block(as_str(&folder), true).unwrap();

        let locked = folder.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Privileged users read through mode 000.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        let outcome = blocker.unblock(&Selection::Position(1));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let outcome = outcome.unwrap();

        assert_eq!(outcome.targets, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(outcome.summary().contains("may remain"));
        assert_eq!(blocker.firewall().rules_for(&hidden).len(), 2);
        assert!(blocker.items().is_empty());
    }

    #[test]
    fn test_selection_parse() {
        assert_eq!(Selection::parse(" 2 "), Selection::Position(2));
        assert_eq!(
            Selection::parse("C:\\Apps\\a.exe"),
            Selection::Path(PathBuf::from("C:\\Apps\\a.exe"))
        );
    }

    #[test]
    fn test_custom_prefix_and_extensions() {
        let fixture = Fixture::new();
        let folder = fixture.folder("tools");
        let com = fixture.file("tools/run.com");
        fixture.file("tools/skip.exe");
        let mut config = Config::default_config();
        config.firewall.rule_prefix = "Fence".to_string();
        config.scan.executable_extensions = vec!["com".to_string()];
        let store = BlockStore::load(&fixture.state_path()).unwrap();
        let mut blocker = Blocker::new(MemoryFirewall::new(), store, &config);

        blocker.block(as_str(&folder), true).unwrap();
        let rules = blocker.firewall().rules();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|rule| rule.program == com));
        assert!(rules[0].name.starts_with("Fence_run.com_"));
    }
}
