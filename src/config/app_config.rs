use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::errors::{AgeBatchError, Result};

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Name of the remembered-recipients file inside the config directory.
pub const RECIPIENTS_FILE: &str = "recipients.txt";

/// Default per-file engine timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Top-level configuration read from `<config dir>/config.toml`.
///
/// Every section is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub engine: EngineSection,
    pub keys: KeysSection,
}

impl AppConfig {
    /// Load the configuration from `config_dir`, falling back to defaults
    /// when the file does not exist.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| AgeBatchError::InvalidConfig {
            detail: format!("Failed to parse {CONFIG_FILE}: {e}"),
        })?;

        if config.engine.timeout_secs == 0 {
            return Err(AgeBatchError::InvalidConfig {
                detail: "engine.timeout_secs must be greater than zero".into(),
            });
        }

        Ok(config)
    }

    /// Per-file engine timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.engine.timeout_secs)
    }
}

/// The `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    /// Explicit engine binary; searched for when absent.
    pub path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// The `[keys]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeysSection {
    /// Remember recipient keys passed with `--key` for later runs.
    pub remember: bool,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self { remember: true }
    }
}
