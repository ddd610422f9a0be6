use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// A location the traversal could not read. Logged and skipped, never fatal.
#[derive(Debug, Error)]
#[error("skipped {}: {message}", path_label(.path))]
pub struct ExpansionError {
    pub path: Option<PathBuf>,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Expansion {
    pub targets: Vec<PathBuf>,
    pub skipped: Vec<ExpansionError>,
}

/// Resolves a declaration into the executables that get a rule pair.
///
/// A file declaration yields the path itself. A folder is walked recursively
/// without following symlinks, sorted by file name, keeping regular files whose
/// extension is in `extensions` (case-insensitive).
pub fn expand(path: &Path, is_folder: bool, extensions: &[String]) -> Expansion {
    if !is_folder {
        return Expansion {
            targets: vec![path.to_path_buf()],
            skipped: Vec::new(),
        };
    }
    if !path.is_dir() {
        debug!(path = %path.display(), "folder no longer exists, nothing to expand");
        return Expansion::default();
    }

    let expansion = collect_targets(
        WalkDir::new(path).follow_links(false).sort_by_file_name(),
        extensions,
    );
    debug!(
        path = %path.display(),
        targets = expansion.targets.len(),
        skipped = expansion.skipped.len(),
        "folder expanded"
    );
    expansion
}

/// Keeps matching regular files from a walk; walk errors are recorded and the walk continues.
pub fn collect_targets<I>(entries: I, extensions: &[String]) -> Expansion
where
    I: IntoIterator<Item = walkdir::Result<DirEntry>>,
{
    let mut expansion = Expansion::default();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let skipped = ExpansionError {
                    path: err.path().map(Path::to_path_buf),
                    message: err.to_string(),
                };
                warn!(error = %skipped, "unreadable location during expansion");
                expansion.skipped.push(skipped);
                continue;
            }
        };
        if entry.file_type().is_file() && has_executable_extension(entry.path(), extensions) {
            expansion.targets.push(entry.into_path());
        }
    }
    expansion
}

pub fn has_executable_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(extension) = path.extension() else {
        return false;
    };
    let extension = extension.to_string_lossy();
    extensions
        .iter()
        .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(&extension))
}

fn path_label(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|value| value.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}
