//! CLI command implementations

pub mod child;
pub mod gate;
pub mod init;
pub mod ledger;
pub mod riddle;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};

use kidbank::config::Config;
use kidbank::economy::Economy;

/// Load config (defaults if absent) and open the economy it points at
pub fn open_economy(config_path: Option<&Path>) -> Result<(Config, Economy)> {
    let config = Config::load(config_path)?;
    let economy = Economy::open(&config)
        .with_context(|| format!("Failed to open {}", config.db_path().display()))?;
    Ok((config, economy))
}
