use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ramp::{compute_ramp, GammaRamp, MAX_GAMMA, MIN_GAMMA};

/// Calibration values for one application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub brightness: f64,
    pub contrast: f64,
    pub gamma: f64,
}

impl Profile {
    pub const NEUTRAL: Profile = Profile {
        brightness: 0.5,
        contrast: 0.5,
        gamma: 1.0,
    };

    pub fn new(brightness: f64, contrast: f64, gamma: f64) -> Self {
        Self {
            brightness,
            contrast,
            gamma,
        }
    }

    /// Same profile with every field forced into its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            brightness: self.brightness.clamp(0.0, 1.0),
            contrast: self.contrast.clamp(0.0, 1.0),
            gamma: self.gamma.clamp(MIN_GAMMA, MAX_GAMMA),
        }
    }

    pub fn ramp(&self) -> GammaRamp {
        GammaRamp::flat(&compute_ramp(self.brightness, self.contrast, self.gamma))
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

fn default_check_updates() -> bool {
    true
}

/// Persisted application settings, `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// OS device names of the displays that receive ramps, in order.
    #[serde(default)]
    pub displays: Vec<String>,
    /// Executable file name (e.g. `game.exe`) to profile.
    #[serde(default)]
    pub applications: BTreeMap<String, Profile>,
    #[serde(default)]
    pub launch_minimized: bool,
    #[serde(default = "default_check_updates")]
    pub check_updates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            displays: Vec::new(),
            applications: BTreeMap::new(),
            launch_minimized: false,
            check_updates: true,
        }
    }
}

impl Config {
    pub fn profile_for(&self, application: &str) -> Option<&Profile> {
        self.applications.get(application)
    }

    /// Drop repeated display names, keeping the first occurrence.
    pub fn dedup_displays(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.displays.retain(|name| seen.insert(name.clone()));
    }
}
