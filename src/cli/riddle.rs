//! Daily riddle commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum RiddleCommand {
    /// Show (and generate if needed) today's riddle
    Show { child: String },
    /// Answer today's riddle
    Solve { child: String, answer: String },
    /// Buy today's hint
    Hint { child: String },
}

pub async fn riddle_command(config_path: Option<&Path>, action: RiddleCommand) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let today = economy.today();

    match action {
        RiddleCommand::Show { child } => {
            let riddle = economy.daily_riddle(&child).await?;
            println!("[{}] {} ({} points)", riddle.day, riddle.question, riddle.points);
            if riddle.solved {
                println!("Already solved!");
            }
        }
        RiddleCommand::Solve { child, answer } => {
            let outcome = economy.solve_riddle(&child, today, &answer)?;
            println!("Correct! +{}, balance {}", outcome.points, outcome.balance);
        }
        RiddleCommand::Hint { child } => {
            let receipt = economy.purchase_hint(&child, today)?;
            println!("Hint: {}", receipt.hint);
            if receipt.charged {
                println!("(charged {}, balance {})", economy.hints().cost(), receipt.balance);
            }
        }
    }
    Ok(())
}
