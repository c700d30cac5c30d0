//! Local control API settings

use serde::{Deserialize, Serialize};

/// Control API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port on 127.0.0.1
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret expected in the X-Kidbank-Token header.
    /// Auth is only enforced when this is non-empty.
    #[serde(default)]
    pub auth_token: String,
}

fn default_port() -> u16 {
    9877
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            auth_token: String::new(),
        }
    }
}
