//! Daily riddle generator settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::riddle::Difficulty;

/// Which generator backs the daily riddle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Built-in offline riddle bank
    #[default]
    Bank,
    /// Remote JSON endpoint
    Http,
}

/// Riddle generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default)]
    pub kind: GeneratorKind,

    /// Endpoint for the HTTP generator (POST {"difficulty": "..."})
    #[serde(default)]
    pub endpoint: String,

    /// Upper bound on a single generation call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest point value accepted from a generator response
    #[serde(default = "default_max_points")]
    pub max_points: i64,

    /// Difficulty used when a child's age is unknown
    #[serde(default)]
    pub default_difficulty: Difficulty,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_points() -> i64 {
    50
}

impl GeneratorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            kind: GeneratorKind::default(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            max_points: default_max_points(),
            default_difficulty: Difficulty::default(),
        }
    }
}
