use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Direction;

pub const INBOUND_SUFFIX: &str = "_In";

/// Names for the outbound/inbound rule pair guarding one executable.
///
/// The disambiguator is drawn fresh on every call and never stored; removal
/// goes by program path, not by these names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleNames {
    pub outbound: String,
    pub inbound: String,
}

impl RuleNames {
    pub fn generate(prefix: &str, target: &Path) -> Self {
        let file_name = target
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let outbound = format!("{prefix}_{file_name}_{}", disambiguator());
        let inbound = format!("{outbound}{INBOUND_SUFFIX}");
        Self { outbound, inbound }
    }

    pub fn for_direction(&self, direction: Direction) -> &str {
        match direction {
            Direction::Out => &self.outbound,
            Direction::In => &self.inbound,
        }
    }
}

/// 32 random bits rendered as eight hex digits.
fn disambiguator() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    simple[..8].to_string()
}
