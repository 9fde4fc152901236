//! Resource profiles
//!
//! Operator-declared sizing presets. Profiles are picked by name, never
//! detected from the hardware.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConfigError;

/// Named resource profile
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceProfile {
    Embedded,
    #[default]
    Standard,
}

/// Settings a profile controls
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub max_view_entries: u32,
    pub max_search_results: u32,
    pub fossilization_threshold: f64,
    pub wal_checkpoint_interval: u32,
    pub log_level: String,
}

impl ResourceProfile {
    pub fn all() -> Vec<ResourceProfile> {
        vec![ResourceProfile::Embedded, ResourceProfile::Standard]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResourceProfile::Embedded => "embedded",
            ResourceProfile::Standard => "standard",
        }
    }

    /// Look up a profile by name
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::all()
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
                available: Self::all().iter().map(|p| p.name()).collect(),
            })
    }

    /// Settings for this profile
    pub fn settings(&self) -> ProfileSettings {
        match self {
            ResourceProfile::Embedded => ProfileSettings {
                max_view_entries: 100,
                max_search_results: 20,
                fossilization_threshold: 0.80,
                wal_checkpoint_interval: 300,
                log_level: "warning".to_string(),
            },
            ResourceProfile::Standard => ProfileSettings {
                max_view_entries: 1000,
                max_search_results: 100,
                fossilization_threshold: 0.90,
                wal_checkpoint_interval: 60,
                log_level: "info".to_string(),
            },
        }
    }
}

impl fmt::Display for ResourceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
