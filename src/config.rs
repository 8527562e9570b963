use std::path::Path;

use serde::Deserialize;

use crate::geometry::{CacheGeometry, Organization};
use crate::metrics::Params;
use crate::replacement::ReplacementPolicy;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => f.write_fmt(format_args!("failed to read config: {e}")),
            ConfigError::Parse(e) => f.write_fmt(format_args!("failed to parse config: {e}")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

/// Normalized simulator configuration. Geometry fields are always at least 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub total_lines: usize,
    pub block_size: usize,
    pub associativity: usize,
    pub organization: Organization,
    pub replacement_policy: ReplacementPolicy,
    pub hit_time: u32,
    pub miss_penalty: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_lines: 8,
            block_size: 1,
            associativity: 2,
            organization: Organization::SetAssociative,
            replacement_policy: ReplacementPolicy::Lru,
            hit_time: 1,
            miss_penalty: 20,
        }
    }
}

impl SimConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(ConfigError::Parse)?;
        Ok(file.into())
    }

    pub fn geometry(&self) -> CacheGeometry {
        CacheGeometry {
            total_lines: self.total_lines,
            block_size: self.block_size,
            associativity: self.associativity,
            organization: self.organization,
        }
    }

    pub fn params(&self) -> Params {
        Params {
            hit_time: self.hit_time,
            miss_penalty: self.miss_penalty,
        }
    }
}

/// Clamps a raw geometry value to at least 1.
pub fn positive(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0).max(1)
}

/// Clamps a raw latency to `0..=u32::MAX`.
pub fn non_negative(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// On-disk form. Values are signed so out of range input can be normalized
/// instead of rejected.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    total_lines: i64,
    block_size: i64,
    associativity: i64,
    organization: Organization,
    replacement_policy: String,
    hit_time: i64,
    miss_penalty: i64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let defaults = SimConfig::default();
        Self {
            total_lines: defaults.total_lines as i64,
            block_size: defaults.block_size as i64,
            associativity: defaults.associativity as i64,
            organization: defaults.organization,
            replacement_policy: defaults.replacement_policy.to_string(),
            hit_time: i64::from(defaults.hit_time),
            miss_penalty: i64::from(defaults.miss_penalty),
        }
    }
}

impl From<ConfigFile> for SimConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            total_lines: positive(file.total_lines),
            block_size: positive(file.block_size),
            associativity: positive(file.associativity),
            organization: file.organization,
            replacement_policy: ReplacementPolicy::from_name(&file.replacement_policy),
            hit_time: non_negative(file.hit_time),
            miss_penalty: non_negative(file.miss_penalty),
        }
    }
}
