//! Detector configuration
//!
//! Every key is optional; a missing file section falls back to the compiled
//! defaults. Example:
//!
//! ```toml
//! max_iterations = 1000
//! stub_end_max_length_m = 5.0
//! amenity_exits = false
//!
//! [severity]
//! routing_island = "other"
//! lonely_way = "error"
//! stub_end = "error"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::IslandsError;
use crate::finding::SeverityTable;

/// Default cap on fixpoint steps
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Default upper bound (meters) for a dangling end to count as a stub
pub const DEFAULT_STUB_END_MAX_LENGTH_M: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Cap on growth steps for every fixpoint loop
    pub max_iterations: usize,
    pub stub_end_max_length_m: f64,
    /// Treat parking and ferry terminal vertices as outside connections
    pub amenity_exits: bool,
    pub severity: SeverityTable,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stub_end_max_length_m: DEFAULT_STUB_END_MAX_LENGTH_M,
            amenity_exits: false,
            severity: SeverityTable::default(),
        }
    }
}

impl DetectorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, IslandsError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, IslandsError> {
        let content = std::fs::read_to_string(path).map_err(|source| IslandsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded detector config");
        Ok(config)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}
