use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::paths::expand_path_template;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub firewall: FirewallConfig,
    pub scan: ScanConfig,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FirewallConfig {
    /// Firewall control binary, `netsh` on Windows.
    pub program: String,
    /// Launcher used to gain administrative rights for rule changes (e.g. `gsudo`).
    /// Unset means netsh runs with the caller's rights, so the shell must be elevated.
    pub elevate_with: Option<String>,
    pub rule_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    pub executable_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StateConfig {
    /// Overrides the declared-intent file; `${DATA_DIR}`, `${CONFIG_DIR}` and `${HOME}` expand.
    pub path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub state_path: PathBuf,
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            firewall: FirewallConfig {
                program: "netsh".to_string(),
                elevate_with: None,
                rule_prefix: "BlockApp".to_string(),
            },
            scan: ScanConfig {
                executable_extensions: vec!["exe".to_string()],
            },
            state: StateConfig::default(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("parse config TOML")?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let output = toml::to_string_pretty(self).context("render config TOML")?;
        Ok(output)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config at {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    /// Loads the config file, falling back to defaults when it has not been written yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default_config());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        let contents = self.to_toml_string()?;
        fs::write(path, contents).with_context(|| format!("write config at {}", path.display()))?;
        Ok(())
    }

    pub fn state_path(&self, paths: &ConfigPaths) -> PathBuf {
        match &self.state.path {
            Some(template) => expand_path_template(template, paths),
            None => paths.state_path.clone(),
        }
    }
}

impl ConfigPaths {
    pub fn resolve() -> Result<Self> {
        let project_dirs = ProjectDirs::from("io", "netfence", "netfence")
            .ok_or_else(|| anyhow::anyhow!("unable to determine project directories"))?;
        let config_dir = project_dirs.config_dir();
        let data_dir = project_dirs.data_dir();
        Ok(Self {
            config_path: config_dir.join("config.toml"),
            data_dir: data_dir.to_path_buf(),
            state_path: data_dir.join("blocked_items.json"),
        })
    }
}
