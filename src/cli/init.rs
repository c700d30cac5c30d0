//! Init and reset commands

use std::path::Path;

use anyhow::{Result, bail};
use tracing::info;

use kidbank::config::Config;

/// Write a default config file
pub fn init_command(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    if Config::init_file(&path, force)? {
        info!("Created {}", path.display());
        println!("Wrote default config to {}", path.display());
        println!("Next: kidbank child add <guardian> <name> && kidbank gate set-code <guardian> <code>");
    } else {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}

/// Delete all economy data
pub fn reset_command(config_path: Option<&Path>, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to reset without --yes");
    }
    let (config, economy) = super::open_economy(config_path)?;
    economy.db().reset_all()?;
    println!("Reset all data in {}", config.db_path().display());
    Ok(())
}
