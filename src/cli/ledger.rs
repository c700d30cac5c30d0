//! Balance, history and economy operation commands

use std::path::Path;

use anyhow::{Result, bail};
use chrono::DateTime;

use kidbank::PiggyKind;

/// clap value parser for piggy bank kinds
pub fn parse_piggy_kind(s: &str) -> Result<PiggyKind, String> {
    PiggyKind::from_str(&s.to_lowercase())
        .ok_or_else(|| format!("expected savings, spending or donation, got '{s}'"))
}

pub fn balance_command(config_path: Option<&Path>, child: &str) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    println!("{}", economy.ledger().balance(child)?);
    Ok(())
}

pub fn history_command(config_path: Option<&Path>, child: &str, limit: usize) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let entries = economy.ledger().history(child, limit)?;
    if entries.is_empty() {
        println!("No ledger entries.");
        return Ok(());
    }

    for entry in entries {
        let when = DateTime::from_timestamp_millis(entry.created_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| entry.day.clone());
        println!(
            "  {} {:>+6} {:<14} {}",
            when, entry.delta, entry.kind, entry.reason
        );
    }
    Ok(())
}

pub fn task_command(config_path: Option<&Path>, child: &str, points: i64, reason: &str) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let balance = economy.complete_task(child, points, reason)?;
    println!("+{} for '{}', balance {}", points, reason, balance);
    Ok(())
}

pub fn reward_command(config_path: Option<&Path>, child: &str, reward_id: &str, cost: i64) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    match economy.claim_reward(child, reward_id, cost) {
        Ok(balance) => println!("Claimed {} for {}, balance {}", reward_id, cost, balance),
        Err(e) if e.is_duplicate() => println!("{} was already claimed", reward_id),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub fn penalty_command(config_path: Option<&Path>, child: &str, points: i64, reason: &str) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let outcome = economy.apply_penalty(child, points, reason)?;
    if outcome.was_capped() {
        println!(
            "-{} (requested {}, capped at balance), balance {}",
            outcome.applied, outcome.requested, outcome.balance
        );
    } else {
        println!("-{}, balance {}", outcome.applied, outcome.balance);
    }
    Ok(())
}

pub fn shop_command(config_path: Option<&Path>, child: &str, item: &str, price: i64) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let balance = economy.shop_purchase(child, item, price)?;
    println!("Bought {} for {}, balance {}", item, price, balance);
    Ok(())
}

pub fn piggy_command(
    config_path: Option<&Path>,
    child: &str,
    kind: PiggyKind,
    amount: i64,
    code: Option<&str>,
) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let balance = economy.piggy_bank_transaction(child, kind, amount, code)?;
    println!("Piggy bank {} of {}, balance {}", kind.as_str(), amount, balance);
    Ok(())
}

pub fn streak_command(config_path: Option<&Path>, child: &str) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let info = economy.streak_info(child)?;
    let status = if info.is_active(economy.today()) {
        "active"
    } else {
        "broken"
    };
    println!("Current streak: {} day(s) ({})", info.current, status);
    println!("Best streak:    {} day(s)", info.best);
    if let Some(last) = info.last_activity_day {
        println!("Last task:      {}", last);
    }
    Ok(())
}

pub fn verify_command(config_path: Option<&Path>, child: &str) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let audit = economy.ledger().verify(child)?;
    println!(
        "initial {} + deltas {} = {} (stored balance {}, {} entries)",
        audit.initial_balance,
        audit.sum_of_deltas,
        audit.initial_balance + audit.sum_of_deltas,
        audit.balance,
        audit.entries
    );
    if !audit.is_consistent() {
        bail!("Ledger for {} is inconsistent", child);
    }
    println!("OK");
    Ok(())
}
