//! Configuration resolution for Lockstep.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/lockstep/settings.json)
//! 3. Project config (.lockstep/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the caller)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Complete Lockstep configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub group: GroupConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Group-channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Bound on any single collective wait, in seconds. 0 waits forever
    /// (the original blocking-collective behavior).
    pub broadcast_timeout_secs: u64,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            broadcast_timeout_secs: 30,
        }
    }
}

impl GroupConfig {
    /// The collective wait bound, `None` meaning unbounded.
    pub fn broadcast_timeout(&self) -> Option<Duration> {
        (self.broadcast_timeout_secs > 0)
            .then(|| Duration::from_secs(self.broadcast_timeout_secs))
    }
}

/// Console display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Rank tag colors, in rank order (crossterm color names). The
    /// palette length caps the supported group size.
    pub palette: Vec<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            palette: ["dark_red", "dark_green", "dark_blue", "dark_magenta"]
                .map(str::to_string)
                .to_vec(),
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    // Load global config
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    // Load project config
    if let Some(dir) = project_dir {
        let project_path = dir.join(".lockstep").join("settings.json");
        if project_path.exists() {
            let project = load_config_file(&project_path)?;
            merge_config(&mut config, project);
        }
    }

    // Apply environment overrides
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".lockstep").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/lockstep/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
            .map(|p| p.join("lockstep").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    base.group = overlay.group;
    base.display = overlay.display;
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("LOCKSTEP_BROADCAST_TIMEOUT") {
        if let Ok(n) = val.parse() {
            config.group.broadcast_timeout_secs = n;
        }
    }
}
