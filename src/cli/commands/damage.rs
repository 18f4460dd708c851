//! `keyaudit mark-damaged` — flip the damaged flag on one purchase unit
//!
//! This is the engine's single ledger write path: a read-modify-write of the
//! whole purchase ledger file. It must be externally serialized against the
//! scraping producer; this command takes no lock of its own.

use anyhow::{bail, Result};
use chrono::Local;
use clap::Args;
use owo_colors::OwoColorize;

use crate::data_paths::DataPaths;
use crate::ledger::damaged::{mark_damaged, UnitSelector};
use crate::ledger::types::mask_key;

#[derive(Args, Clone)]
pub struct MarkDamagedArgs {
    /// Ledger uid of the unit to mark
    #[arg(long, conflicts_with = "key")]
    pub uid: Option<String>,

    /// Activation key of the unit to mark
    #[arg(long)]
    pub key: Option<String>,

    /// Why the unit is unsellable
    #[arg(long, default_value = "manually marked")]
    pub reason: String,
}

pub fn execute(data_paths: DataPaths, args: MarkDamagedArgs) -> Result<()> {
    let selector = match (&args.uid, &args.key) {
        (Some(uid), _) => UnitSelector::Uid(uid.clone()),
        (None, Some(key)) => UnitSelector::Key(key.clone()),
        (None, None) => bail!("Provide --uid or --key to identify the unit"),
    };

    let entry = mark_damaged(
        &data_paths.purchase_ledger(),
        &data_paths.damaged_registry(),
        &selector,
        &args.reason,
        Local::now(),
    )?;

    println!(
        "{}",
        format!("🚫 Marked damaged: {} ({})", entry.name, mask_key(&entry.key)).yellow()
    );
    println!("   Cost stays in the books; the unit is excluded from the missing list.");
    Ok(())
}
