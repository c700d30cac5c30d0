use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "kidbank")]
#[command(about = "Child economy ledger with a parental gate and daily riddles")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.kidbank/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default ~/.kidbank/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Manage child accounts
    Child {
        #[command(subcommand)]
        action: cli::child::ChildCommand,
    },

    /// Show a child's balance
    Balance { child: String },

    /// Show a child's ledger history (newest first)
    History {
        child: String,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Credit points for a completed task
    Task {
        child: String,
        points: i64,
        #[arg(short, long, default_value = "task")]
        reason: String,
    },

    /// Claim a reward instance
    Reward {
        child: String,
        reward_id: String,
        cost: i64,
    },

    /// Deduct points (never below zero)
    Penalty {
        child: String,
        points: i64,
        #[arg(short, long, default_value = "penalty")]
        reason: String,
    },

    /// Buy an item from the shop
    Shop {
        child: String,
        item: String,
        price: i64,
    },

    /// Piggy bank movement: savings (needs parent code), spending, donation
    Piggy {
        child: String,
        #[arg(value_parser = cli::ledger::parse_piggy_kind)]
        kind: kidbank::PiggyKind,
        amount: i64,
        /// Parent code (required for savings)
        #[arg(long)]
        code: Option<String>,
    },

    /// Show current and best streak
    Streak { child: String },

    /// Check balance == initial + sum of ledger deltas
    Verify { child: String },

    /// Parental gate management
    Gate {
        #[command(subcommand)]
        action: cli::gate::GateCommand,
    },

    /// Daily riddle
    Riddle {
        #[command(subcommand)]
        action: cli::riddle::RiddleCommand,
    },

    /// Run the local control API
    Serve {
        /// Port to listen on (defaults to [server].port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Delete all economy data
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => cli::init::init_command(config_path, force)?,
        Commands::Child { action } => cli::child::child_command(config_path, action)?,
        Commands::Balance { child } => cli::ledger::balance_command(config_path, &child)?,
        Commands::History { child, limit } => {
            cli::ledger::history_command(config_path, &child, limit)?
        }
        Commands::Task {
            child,
            points,
            reason,
        } => cli::ledger::task_command(config_path, &child, points, &reason)?,
        Commands::Reward {
            child,
            reward_id,
            cost,
        } => cli::ledger::reward_command(config_path, &child, &reward_id, cost)?,
        Commands::Penalty {
            child,
            points,
            reason,
        } => cli::ledger::penalty_command(config_path, &child, points, &reason)?,
        Commands::Shop { child, item, price } => {
            cli::ledger::shop_command(config_path, &child, &item, price)?
        }
        Commands::Piggy {
            child,
            kind,
            amount,
            code,
        } => cli::ledger::piggy_command(config_path, &child, kind, amount, code.as_deref())?,
        Commands::Streak { child } => cli::ledger::streak_command(config_path, &child)?,
        Commands::Verify { child } => cli::ledger::verify_command(config_path, &child)?,
        Commands::Gate { action } => cli::gate::gate_command(config_path, action)?,
        Commands::Riddle { action } => cli::riddle::riddle_command(config_path, action).await?,
        Commands::Serve { port } => cli::serve::serve_command(config_path, port)?,
        Commands::Reset { yes } => cli::init::reset_command(config_path, yes)?,
    }

    Ok(())
}
