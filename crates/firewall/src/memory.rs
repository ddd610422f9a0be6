use std::path::{Path, PathBuf};

use netfence_core::error::ControlError;
use netfence_core::types::Direction;

use crate::FirewallControl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirewallCall {
    Add {
        direction: Direction,
        name: String,
        program: PathBuf,
    },
    DeleteByProgram {
        program: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRule {
    pub direction: Direction,
    pub name: String,
    pub program: PathBuf,
}

/// In-process firewall that records every call; used to drive the orchestrator without netsh.
#[derive(Debug, Default)]
pub struct MemoryFirewall {
    calls: Vec<FirewallCall>,
    rules: Vec<ActiveRule>,
    fail_on_call: Option<usize>,
}

impl MemoryFirewall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the call with zero-based index `index` fail. The failing call is still recorded.
    pub fn failing_on_call(index: usize) -> Self {
        Self {
            fail_on_call: Some(index),
            ..Self::default()
        }
    }

    /// Seeds a rule that some other tool created.
    pub fn with_rule(mut self, direction: Direction, name: &str, program: &Path) -> Self {
        self.rules.push(ActiveRule {
            direction,
            name: name.to_string(),
            program: program.to_path_buf(),
        });
        self
    }

    pub fn calls(&self) -> &[FirewallCall] {
        &self.calls
    }

    pub fn rules(&self) -> &[ActiveRule] {
        &self.rules
    }

    pub fn rules_for(&self, program: &Path) -> Vec<&ActiveRule> {
        self.rules.iter().filter(|rule| rule.program == program).collect()
    }

    fn record(&mut self, call: FirewallCall) -> Result<(), ControlError> {
        let index = self.calls.len();
        self.calls.push(call);
        if self.fail_on_call == Some(index) {
            return Err(ControlError::Rejected {
                command: format!("call #{index}"),
                status: "exit code: 1".to_string(),
                output: "The requested operation requires elevation (Run as administrator)."
                    .to_string(),
            });
        }
        Ok(())
    }
}

impl FirewallControl for MemoryFirewall {
    fn add_block_rule(
        &mut self,
        direction: Direction,
        name: &str,
        program: &Path,
    ) -> Result<(), ControlError> {
        self.record(FirewallCall::Add {
            direction,
            name: name.to_string(),
            program: program.to_path_buf(),
        })?;
        self.rules.push(ActiveRule {
            direction,
            name: name.to_string(),
            program: program.to_path_buf(),
        });
        Ok(())
    }

    fn delete_rules_by_program(&mut self, program: &Path) -> Result<usize, ControlError> {
        self.record(FirewallCall::DeleteByProgram {
            program: program.to_path_buf(),
        })?;
        let before = self.rules.len();
        self.rules.retain(|rule| rule.program != program);
        Ok(before - self.rules.len())
    }
}
