//! Parental gate commands

use std::path::Path;

use anyhow::Result;
use chrono::DateTime;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum GateCommand {
    /// Set or replace a guardian's parent code
    SetCode { guardian: String, code: String },
    /// Check a parent code (counts toward the lockout)
    Verify { guardian: String, code: String },
    /// Show failed attempts and lockout state
    Status { guardian: String },
    /// Show recent verification attempts
    Log {
        guardian: String,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

pub fn gate_command(config_path: Option<&Path>, action: GateCommand) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let gate = economy.gate();

    match action {
        GateCommand::SetCode { guardian, code } => {
            gate.set_code(&guardian, &code)?;
            println!("Parent code set for {}", guardian);
        }
        GateCommand::Verify { guardian, code } => {
            economy.verify_parent_code(&guardian, &code)?;
            println!("Code accepted");
        }
        GateCommand::Status { guardian } => {
            let status = gate.status(&guardian)?;
            if !status.configured {
                println!("No parent code set for {}", guardian);
                return Ok(());
            }
            match status.locked_for {
                Some(left) => println!("Locked for another {}s", left.as_secs()),
                None => println!("Unlocked ({} failed attempts)", status.failed_attempts),
            }
        }
        GateCommand::Log { guardian, limit } => {
            for entry in gate.audit_log(&guardian, limit)? {
                let when = DateTime::from_timestamp_millis(entry.created_at)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!("  {} {}", when, entry.outcome.as_str());
            }
        }
    }
    Ok(())
}
