//! # World Configuration
//!
//! Sizing and diagnostics knobs, loaded once at startup.
//!
//! ```toml
//! entity_capacity = 100000
//! archetype_capacity = 256
//! slow_system_threshold_ms = 8
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{EcsError, EcsResult};

/// Default number of entity slots reserved up front.
pub const DEFAULT_ENTITY_CAPACITY: usize = 1024;

/// Default initial row capacity of a new archetype.
pub const DEFAULT_ARCHETYPE_CAPACITY: usize = 64;

/// Default slow-system warning threshold (one 60 Hz frame).
pub const DEFAULT_SLOW_SYSTEM_THRESHOLD_MS: u64 = 16;

/// Configuration for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Entity slots reserved at creation.
    pub entity_capacity: usize,
    /// Initial row capacity of each new archetype.
    pub archetype_capacity: usize,
    /// Timed runs log a warning for systems slower than this.
    pub slow_system_threshold_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: DEFAULT_ENTITY_CAPACITY,
            archetype_capacity: DEFAULT_ARCHETYPE_CAPACITY,
            slow_system_threshold_ms: DEFAULT_SLOW_SYSTEM_THRESHOLD_MS,
        }
    }
}

impl WorldConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] on malformed TOML, unknown keys or
    /// mistyped values.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EcsError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// The slow-system threshold as a `Duration`.
    #[must_use]
    pub const fn slow_system_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_system_threshold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = WorldConfig::from_toml_str("entity_capacity = 50").unwrap();
        assert_eq!(config.entity_capacity, 50);
        assert_eq!(config.archetype_capacity, DEFAULT_ARCHETYPE_CAPACITY);
        assert_eq!(config.slow_system_threshold(), Duration::from_millis(16));
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(WorldConfig::from_toml_str("").unwrap(), WorldConfig::default());
    }

    #[test]
    fn test_bad_input_is_invalid_config() {
        for source in ["entity_capacity = \"many\"", "unknown_key = 1", "not toml ["] {
            assert!(matches!(
                WorldConfig::from_toml_str(source),
                Err(EcsError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_missing_file() {
        let err = WorldConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("here.toml"));
    }
}
