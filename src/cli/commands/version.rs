//! `keyaudit version` — build information

use anyhow::Result;
use clap::Args;

#[derive(Args, Clone)]
pub struct VersionArgs {}

pub fn execute(_args: VersionArgs) -> Result<()> {
    println!("keyaudit {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
