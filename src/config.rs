// Configuration loading.
// Reads the TOML config file and fills every missing key with a default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Cache name of the current asset cache generation.
pub const DEFAULT_CACHE_VERSION: &str = "tele-schocken-static-v1";

/// Game server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the game server.
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
        }
    }
}

/// Game session settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Game to administer when none is given on the command line.
    pub id: Option<String>,
}

/// Static asset cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Origin relative asset paths are resolved against; the server URL if unset.
    pub origin: Option<String>,
    /// Name of the current cache generation. Other caches are dropped on activation.
    pub cache_version: String,
    /// Days an entry may go unused before the sweep removes it.
    pub retention_days: u32,
    /// Hours between two expiry sweeps.
    pub sweep_interval_hours: u32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            origin: None,
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            retention_days: 60,
            sweep_interval_hours: 24,
        }
    }
}

impl AssetConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_days) * 24 * 60 * 60)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.sweep_interval_hours.max(1)) * 60 * 60)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub game: GameConfig,
    pub assets: AssetConfig,
}

impl Config {
    /// Load configuration from `path`, using defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Origin used to resolve relative asset URLs.
    pub fn asset_origin(&self) -> &str {
        self.assets.origin.as_deref().unwrap_or(&self.server.base_url)
    }
}
