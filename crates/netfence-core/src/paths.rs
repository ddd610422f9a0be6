use std::path::{Component, Path, PathBuf};

use crate::config::ConfigPaths;

/// Hint text an input form shows before the operator types anything.
pub const PATH_PLACEHOLDER: &str = "Enter file or folder path...";

/// Trims surrounding whitespace and trailing separators from an operator-supplied path.
///
/// Returns `None` for blank input and for the placeholder text.
pub fn clean_declared_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == PATH_PLACEHOLDER {
        return None;
    }
    let mut value = trimmed.to_string();
    while value.len() > 1 && value.ends_with(['/', '\\']) && !is_drive_root(&value) {
        value.pop();
    }
    Some(PathBuf::from(value))
}

/// Anchors a relative declaration at `base` and drops `.` components; absolute paths pass through.
pub fn absolute_from(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

/// Comparison key for declared paths: separators unified, trailing ones dropped, lowercased.
pub fn normalized_key(path: &Path) -> String {
    let mut key = path.to_string_lossy().trim().replace('\\', "/");
    while key.len() > 1 && key.ends_with('/') && !is_drive_root(&key) {
        key.pop();
    }
    key.to_lowercase()
}

fn is_drive_root(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

pub fn expand_path_template(template: &str, paths: &ConfigPaths) -> PathBuf {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| "/".to_string());
    let replaced = template
        .replace("${HOME}", &home_dir)
        .replace("${DATA_DIR}", &paths.data_dir.to_string_lossy())
        .replace(
            "${CONFIG_DIR}",
            &paths
                .config_path
                .parent()
                .unwrap_or(&paths.data_dir)
                .to_string_lossy(),
        );
    PathBuf::from(replaced)
}
