// SPDX-License-Identifier: MIT OR Apache-2.0
//! Surface configuration.

use crate::error::Result;
use egui::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables of a surface, stored as RON in the editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Whether an undo history is attached on creation
    pub record_history: bool,
    /// Maximum undo depth
    pub history_depth: usize,
    /// Bound on the wait for background archetype groups, in milliseconds
    pub pending_groups_timeout_ms: u64,
    /// Offset applied by duplicate when no target location is given
    pub duplicate_offset: Vec2,
    /// Overrides the policy's implicit object to boolean cast
    pub implicit_object_to_bool: Option<bool>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            record_history: true,
            history_depth: 100,
            pending_groups_timeout_ms: 5000,
            duplicate_offset: Vec2::new(40.0, 40.0),
            implicit_object_to_bool: None,
        }
    }
}

impl SurfaceConfig {
    /// Parse from RON text; missing fields keep their defaults
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Pending group wait as a duration
    pub fn pending_groups_timeout(&self) -> Duration {
        Duration::from_millis(self.pending_groups_timeout_ms)
    }
}
