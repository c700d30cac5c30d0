//! Settings configuration types

mod economy;
mod gate;
mod generator;
mod server;

pub use economy::EconomySettings;
pub use gate::GateSettings;
pub use generator::{GeneratorKind, GeneratorSettings};
pub use server::ServerSettings;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Database location settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseSettings {
    /// Path to the economy database.
    /// Defaults to ~/.kidbank/economy.db when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
