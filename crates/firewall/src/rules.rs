//! Parsing of `netsh advfirewall firewall show rule` listings.
//!
//! Used for diagnostics only; nothing here feeds back into block or unblock.

use serde::{Deserialize, Serialize};

use netfence_core::types::Direction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub name: String,
    pub direction: Option<Direction>,
    pub action: Option<String>,
    pub program: Option<String>,
}

/// Splits a listing into blank-line separated blocks and reads each block's fields.
pub fn parse_rule_listing(output: &str) -> Vec<RuleSummary> {
    let normalized = output.replace("\r\n", "\n");
    let mut rules = Vec::new();
    for block in normalized.split("\n\n") {
        if let Some(rule) = parse_block(block) {
            rules.push(rule);
        }
    }
    rules
}

fn parse_block(block: &str) -> Option<RuleSummary> {
    let mut name = None;
    let mut direction = None;
    let mut action = None;
    let mut program = None;
    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "rule name" => name = Some(value.to_string()),
            "direction" => direction = value.parse().ok(),
            "action" => action = Some(value.to_string()),
            "program" => program = Some(value.to_string()),
            _ => {}
        }
    }
    name.map(|name| RuleSummary {
        name,
        direction,
        action,
        program,
    })
}
