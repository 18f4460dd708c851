//! `keyaudit audit` — run the full reconciliation pipeline

use anyhow::Result;
use chrono::Local;
use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::AuditConfig;
use crate::data_paths::DataPaths;
use crate::pipeline;
use crate::report::display::print_dashboard;

#[derive(Args, Clone)]
pub struct AuditArgs {
    /// Override the configured marketplace payout rate (e.g. 0.97)
    #[arg(long, value_parser = parse_payout_rate)]
    pub payout_rate: Option<Decimal>,

    /// Write the report without printing the dashboard
    #[arg(long)]
    pub quiet: bool,
}

fn parse_payout_rate(raw: &str) -> Result<Decimal, String> {
    let rate: Decimal = raw.parse().map_err(|e| format!("not a decimal: {e}"))?;
    if rate <= Decimal::ZERO || rate > Decimal::ONE {
        return Err("payout rate must be in (0, 1]".to_string());
    }
    Ok(rate)
}

pub fn execute(data_paths: DataPaths, args: AuditArgs) -> Result<()> {
    let mut config = AuditConfig::load(&data_paths.audit_config());
    if let Some(rate) = args.payout_rate {
        info!(%rate, "Payout rate overridden from command line");
        config.payout_rate = rate;
    }

    let report = pipeline::run(&data_paths, &config, Local::now())?;

    if !args.quiet {
        print_dashboard(&report);
    }
    Ok(())
}
