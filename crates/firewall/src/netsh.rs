use std::path::Path;

use tracing::{debug, info};

use netfence_core::config::FirewallConfig;
use netfence_core::error::ControlError;
use netfence_core::types::Direction;

use crate::command::{CommandOutput, FirewallCommand};
use crate::rules::{parse_rule_listing, RuleSummary};
use crate::FirewallControl;

const NO_MATCH_MARKER: &str = "no rules match the specified criteria";

/// Windows Defender Firewall driven through `netsh advfirewall firewall`.
#[derive(Debug, Clone)]
pub struct NetshFirewall {
    program: String,
    elevate_with: Option<String>,
}

impl NetshFirewall {
    pub fn new(program: impl Into<String>, elevate_with: Option<String>) -> Self {
        Self {
            program: program.into(),
            elevate_with,
        }
    }

    pub fn from_config(config: &FirewallConfig) -> Self {
        Self::new(config.program.clone(), config.elevate_with.clone())
    }

    fn mutation(&self, args: Vec<String>) -> FirewallCommand {
        FirewallCommand::new(self.program.clone(), args).elevated(self.elevate_with.as_deref())
    }

    /// Read-only listing of every rule the firewall knows; runs without elevation.
    pub fn list_rules(&self) -> Result<Vec<RuleSummary>, ControlError> {
        let command = FirewallCommand::new(self.program.clone(), show_rule_args());
        let output = command.run()?;
        if !output.success {
            return Err(rejected(&command, output));
        }
        Ok(parse_rule_listing(&output.text))
    }
}

impl FirewallControl for NetshFirewall {
    fn add_block_rule(
        &mut self,
        direction: Direction,
        name: &str,
        program: &Path,
    ) -> Result<(), ControlError> {
        let command = self.mutation(add_rule_args(direction, name, program));
        debug!(command = %command.display(), "adding firewall rule");
        let output = command.run()?;
        if !output.success {
            return Err(rejected(&command, output));
        }
        info!(rule = name, %direction, program = %program.display(), "block rule added");
        Ok(())
    }

    fn delete_rules_by_program(&mut self, program: &Path) -> Result<usize, ControlError> {
        let command = self.mutation(delete_rule_args(program));
        debug!(command = %command.display(), "deleting firewall rules");
        let output = command.run()?;
        // netsh exits non-zero when nothing matched; that is still a clean result.
        if output.text.to_lowercase().contains(NO_MATCH_MARKER) {
            debug!(program = %program.display(), "no rules referenced program");
            return Ok(0);
        }
        if !output.success {
            return Err(rejected(&command, output));
        }
        let removed = parse_deleted_count(&output.text).unwrap_or(0);
        info!(removed, program = %program.display(), "rules deleted");
        Ok(removed)
    }
}

pub fn add_rule_args(direction: Direction, name: &str, program: &Path) -> Vec<String> {
    vec![
        "advfirewall".to_string(),
        "firewall".to_string(),
        "add".to_string(),
        "rule".to_string(),
        format!("name={name}"),
        format!("dir={}", direction.netsh_value()),
        "action=block".to_string(),
        format!("program={}", program.display()),
        "enable=yes".to_string(),
    ]
}

pub fn delete_rule_args(program: &Path) -> Vec<String> {
    vec![
        "advfirewall".to_string(),
        "firewall".to_string(),
        "delete".to_string(),
        "rule".to_string(),
        "name=all".to_string(),
        format!("program={}", program.display()),
    ]
}

pub fn show_rule_args() -> Vec<String> {
    vec![
        "advfirewall".to_string(),
        "firewall".to_string(),
        "show".to_string(),
        "rule".to_string(),
        "name=all".to_string(),
        "verbose".to_string(),
    ]
}

/// Reads the count out of netsh's `Deleted N rule(s).` confirmation.
pub fn parse_deleted_count(output: &str) -> Option<usize> {
    output.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("Deleted ")?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

fn rejected(command: &FirewallCommand, output: CommandOutput) -> ControlError {
    ControlError::Rejected {
        command: command.display(),
        status: output.status,
        output: output.text,
    }
}
