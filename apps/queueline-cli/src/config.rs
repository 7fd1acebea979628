//! CLI configuration: a TOML file with serde defaults, constructed once per
//! session and handed to the engines.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use queueline_recon::ReconConfig;

fn default_roster_url() -> String {
    "https://api.sleeper.app/v1/players/nfl".to_string()
}

fn default_cache_path() -> PathBuf {
    std::env::temp_dir().join("queueline-roster.json")
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_min_fetch_interval_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RosterSection {
    #[serde(default = "default_roster_url")]
    pub url: String,
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
    /// Minimum pause between network fetches; a courtesy rate limit, the
    /// provider sleeps out any remainder before refetching.
    #[serde(default = "default_min_fetch_interval_secs")]
    pub min_fetch_interval_secs: u64,
}

impl Default for RosterSection {
    fn default() -> Self {
        Self {
            url: default_roster_url(),
            cache_path: default_cache_path(),
            cache_ttl_hours: default_cache_ttl_hours(),
            min_fetch_interval_secs: default_min_fetch_interval_secs(),
        }
    }
}

fn default_inter_op_delay_ms() -> u64 {
    150
}

fn default_settle_delay_ms() -> u64 {
    250
}

fn default_remove_label() -> String {
    "Remove".to_string()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReconSection {
    #[serde(default = "default_inter_op_delay_ms")]
    pub inter_op_delay_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_remove_label")]
    pub remove_label: String,
}

impl Default for ReconSection {
    fn default() -> Self {
        Self {
            inter_op_delay_ms: default_inter_op_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            remove_label: default_remove_label(),
        }
    }
}

impl ReconSection {
    pub fn to_recon_config(&self) -> ReconConfig {
        ReconConfig {
            inter_op_delay: Duration::from_millis(self.inter_op_delay_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            remove_label: self.remove_label.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub roster: RosterSection,
    #[serde(default)]
    pub recon: ReconSection,
}

/// Load configuration. An explicit path that does not exist is an error; no
/// path means defaults.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: CliConfig = toml::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_missing_sections() {
        let cfg: CliConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.roster.cache_ttl_hours, 24);
        assert_eq!(cfg.recon.inter_op_delay_ms, 150);
        assert_eq!(cfg.recon.remove_label, "Remove");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg: CliConfig = toml::from_str("[recon]\nsettle_delay_ms = 500\n").unwrap();
        assert_eq!(cfg.recon.settle_delay_ms, 500);
        assert_eq!(cfg.recon.inter_op_delay_ms, 150);
    }
}
