use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by the firewall control surface.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to launch {program}: {message}")]
    Spawn { program: String, message: String },
    #[error("{command} exited with {status}: {output}")]
    Rejected {
        command: String,
        status: String,
        output: String,
    },
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("invalid path: {0}")]
    Validation(String),
    #[error("{kind} does not exist: {}", .path.display())]
    NotFound { path: PathBuf, kind: &'static str },
    #[error("already blocked: {}", .0.display())]
    Duplicate(PathBuf),
    #[error("not blocked: {0}")]
    NotBlocked(String),
    #[error("firewall change failed: {0}")]
    Control(#[from] ControlError),
    #[error("state file error: {0}")]
    Persistence(String),
}

impl BlockError {
    /// True for rejections raised before any firewall side effect.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BlockError::Validation(_)
                | BlockError::NotFound { .. }
                | BlockError::Duplicate(_)
                | BlockError::NotBlocked(_)
        )
    }
}
