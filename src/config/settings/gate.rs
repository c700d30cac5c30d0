//! Parental gate settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lockout policy for parent code verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSettings {
    /// Consecutive failures that trigger a lockout
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lockout length in seconds
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_lockout_secs() -> u64 {
    300 // 5 minutes
}

impl GateSettings {
    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.lockout_secs)
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            lockout_secs: default_lockout_secs(),
        }
    }
}
