//! `keyaudit blacklist` — manage keys excluded from reconciliation

use anyhow::Result;
use clap::{Args, Subcommand};
use owo_colors::OwoColorize;

use crate::data_paths::DataPaths;
use crate::ledger::blacklist::{Blacklist, BlacklistSide};
use crate::ledger::types::mask_key;

#[derive(Args, Clone)]
pub struct BlacklistArgs {
    #[command(subcommand)]
    pub action: BlacklistAction,
}

#[derive(Subcommand, Clone)]
pub enum BlacklistAction {
    /// Add a key to the blacklist
    Add {
        /// Activation key to exclude
        key: String,

        /// Which ledger the exclusion applies to
        #[arg(long, value_enum, default_value = "both")]
        side: BlacklistSide,
    },

    /// List blacklisted keys
    List,
}

pub fn execute(data_paths: DataPaths, args: BlacklistArgs) -> Result<()> {
    let path = data_paths.blacklist();
    match args.action {
        BlacklistAction::Add { key, side } => {
            let mut blacklist = Blacklist::load(&path);
            blacklist.add(&key, side);
            blacklist.save(&path)?;
            println!("{}", format!("🚫 Blacklisted {} ({:?} side)", mask_key(&key), side).yellow());
        }
        BlacklistAction::List => {
            let blacklist = Blacklist::load(&path);
            if blacklist.is_empty() {
                println!("Blacklist is empty");
                return Ok(());
            }
            for entry in blacklist.entries() {
                println!("  {} ({:?})", mask_key(&entry.key), entry.side);
            }
        }
    }
    Ok(())
}
