use std::path::Path;

use netfence_core::error::ControlError;
use netfence_core::types::Direction;

pub mod command;
pub mod memory;
pub mod netsh;
pub mod rules;

pub use command::FirewallCommand;
pub use memory::{FirewallCall, MemoryFirewall};
pub use netsh::NetshFirewall;
pub use rules::RuleSummary;

/// The two firewall mutations the blocker relies on.
///
/// Implementations may block for as long as the underlying mechanism needs;
/// a refused privilege elevation is reported like any other failure.
pub trait FirewallControl {
    /// Creates a rule denying all traffic in `direction` for `program`.
    fn add_block_rule(
        &mut self,
        direction: Direction,
        name: &str,
        program: &Path,
    ) -> Result<(), ControlError>;

    /// Removes every rule whose program is exactly `program`, whoever created it.
    /// Returns how many were removed; zero is not an error.
    fn delete_rules_by_program(&mut self, program: &Path) -> Result<usize, ControlError>;
}
