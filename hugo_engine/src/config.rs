use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::release::{GameRelease, ReleaseProfile};

/// Event slots the shipped games were written against.
pub const DEFAULT_EVENT_CAPACITY: usize = 50;

/// Number of release sections stored in the script resource.
pub const DEFAULT_VARIANT_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub release: GameRelease,
    pub event_capacity: usize,
    /// Overrides the release's native tick rate.
    pub ticks_per_second: Option<u32>,
    pub variant_count: usize,
    /// Overrides the release's section index in the script resource.
    pub variant: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            release: GameRelease::Hugo1Win,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            ticks_per_second: None,
            variant_count: DEFAULT_VARIANT_COUNT,
            variant: None,
        }
    }
}

impl SchedulerConfig {
    pub fn for_release(release: GameRelease) -> Self {
        Self {
            release,
            ..Self::default()
        }
    }

    /// Reads a JSON config, falling back to defaults when no path is given.
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scheduler config: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scheduler config: {}", path.display()))
    }

    pub fn profile(&self) -> ReleaseProfile {
        let mut profile = self.release.profile();
        if let Some(tps) = self.ticks_per_second {
            profile.ticks_per_second = tps;
        }
        profile
    }

    pub fn variant(&self) -> usize {
        self.variant.unwrap_or_else(|| self.release.variant())
    }
}
