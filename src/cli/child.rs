//! Child account commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use kidbank::NewChild;

#[derive(Subcommand)]
pub enum ChildCommand {
    /// Onboard a child
    Add {
        guardian: String,
        name: String,
        #[arg(long)]
        age: Option<u32>,
        /// Starting balance
        #[arg(long, default_value_t = 0)]
        balance: i64,
        /// Explicit id (a UUID is generated otherwise)
        #[arg(long)]
        id: Option<String>,
    },
    /// List a guardian's children
    List { guardian: String },
    /// Show one child
    Show { id: String },
    /// Delete a child and all of its history
    Delete { guardian: String, id: String },
}

pub fn child_command(config_path: Option<&Path>, action: ChildCommand) -> Result<()> {
    let (_config, economy) = super::open_economy(config_path)?;
    let children = economy.children();

    match action {
        ChildCommand::Add {
            guardian,
            name,
            age,
            balance,
            id,
        } => {
            let mut new = NewChild::new(guardian, name).with_balance(balance);
            if let Some(age) = age {
                new = new.with_age(age);
            }
            if let Some(id) = id {
                new = new.with_id(id);
            }
            let child = children.create(new)?;
            println!("Added {} ({}) with {} points", child.name, child.id, child.balance);
        }
        ChildCommand::List { guardian } => {
            let list = children.list_for_guardian(&guardian)?;
            if list.is_empty() {
                println!("No children for {}.", guardian);
                return Ok(());
            }
            println!("Children ({}):\n", list.len());
            for child in list {
                let age = child.age.map(|a| format!(", age {a}")).unwrap_or_default();
                println!("  {} {}{} - {} points", child.id, child.name, age, child.balance);
            }
        }
        ChildCommand::Show { id } => {
            let child = children.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&child)?);
        }
        ChildCommand::Delete { guardian, id } => {
            children.delete(&guardian, &id)?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}
