use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use blocker::Blocker;
use firewall::NetshFirewall;
use netfence_core::config::{Config, ConfigPaths};
use netfence_core::error::BlockError;
use netfence_core::store::BlockStore;

pub mod block;
pub mod config;
pub mod list;
pub mod rules;
pub mod unblock;

/// Options shared by every command that touches config or state.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
}

impl GlobalOptions {
    pub fn load_config(&self) -> Result<(Config, ConfigPaths)> {
        let paths = ConfigPaths::resolve()?;
        let config_path = self
            .config_path
            .clone()
            .unwrap_or_else(|| paths.config_path.clone());
        let config = Config::load_or_default(&config_path)
            .with_context(|| format!("load config {}", config_path.display()))?;
        Ok((config, paths))
    }

    pub fn open_store(&self, config: &Config, paths: &ConfigPaths) -> Result<BlockStore> {
        let state_path = self
            .state_path
            .clone()
            .unwrap_or_else(|| config.state_path(paths));
        debug!(state = %state_path.display(), "loading declared items");
        let store = BlockStore::load(&state_path)
            .with_context(|| format!("load blocked items {}", state_path.display()))?;
        Ok(store)
    }

    pub fn open_blocker(&self) -> Result<Blocker<NetshFirewall>> {
        let (config, paths) = self.load_config()?;
        let store = self.open_store(&config, &paths)?;
        let firewall = NetshFirewall::from_config(&config.firewall);
        Ok(Blocker::new(firewall, store, &config))
    }
}

/// Attaches what the operator should do next to a block or unblock failure.
pub fn explain(err: BlockError) -> anyhow::Error {
    let hint = if err.is_input_error() {
        "nothing was changed"
    } else {
        "firewall or state file may be partially updated; check `netfence rules` and run from an elevated shell"
    };
    anyhow::Error::new(err).context(hint)
}
