//! Command-line interface for the inventory auditor
//!
//! Clap argument parsing plus a structured command pattern: each subcommand
//! owns an `Args` struct and an `execute` entry point under `commands/`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use crate::data_paths::{DataPaths, DEFAULT_DATA_DIR};
use crate::logging::{init_logging, LoggingConfig};
use commands::audit::AuditArgs;
use commands::blacklist::BlacklistArgs;
use commands::damage::MarkDamagedArgs;
use commands::version::VersionArgs;

#[derive(Parser)]
#[command(name = "keyaudit")]
#[command(version)]
#[command(about = "Key-based inventory reconciliation and profit attribution", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory path (default: ./data)
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile the ledgers and write the financial report
    Audit(AuditArgs),

    /// Mark one purchase unit as permanently unsellable
    MarkDamaged(MarkDamagedArgs),

    /// Manage the key blacklist
    Blacklist(BlacklistArgs),

    /// Show version information
    Version(VersionArgs),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(&self.data_dir);
        init_logging(LoggingConfig::new(data_paths.clone(), self.verbose))?;

        match self.command {
            Commands::Audit(args) => commands::audit::execute(data_paths, args),
            Commands::MarkDamaged(args) => commands::damage::execute(data_paths, args),
            Commands::Blacklist(args) => commands::blacklist::execute(data_paths, args),
            Commands::Version(args) => commands::version::execute(args),
        }
    }
}
