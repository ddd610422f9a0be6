use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::paths::normalized_key;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// A declared intent to cut a path off the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockedItem {
    pub path: PathBuf,
    pub is_folder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_at: Option<OffsetDateTime>,
}

impl Direction {
    pub fn netsh_value(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Direction::In => "inbound",
            Direction::Out => "outbound",
        };
        write!(f, "{value}")
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "in" | "inbound" => Ok(Direction::In),
            "out" | "outbound" => Ok(Direction::Out),
            _ => Err(format!("unknown direction: {value}")),
        }
    }
}

impl BlockedItem {
    pub fn new(path: PathBuf, is_folder: bool) -> Self {
        Self {
            path,
            is_folder,
            blocked_at: Some(OffsetDateTime::now_utc()),
        }
    }

    pub fn key(&self) -> String {
        normalized_key(&self.path)
    }

    pub fn matches(&self, candidate: &Path) -> bool {
        self.key() == normalized_key(candidate)
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_folder {
            "FOLDER"
        } else {
            "APP"
        }
    }
}
