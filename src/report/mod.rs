//! Report assembly and persistence
//!
//! The report is a single latest-snapshot artifact: building it is pure, and
//! saving it fully overwrites the previous file. Consumers get the same shape
//! every run, including the zeroed skeleton emitted on internal failure.

pub mod display;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::ledger::types::{mask_key, LEDGER_TIME_FORMAT};
use crate::reconcile::engine::{Bucket, ReconcileOutcome};
use crate::reconcile::FinancialSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub update_at: String,
    pub summary: ReportSummary,
    pub details: ReportDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_investment: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub realized_cash: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub floating_asset: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_profit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expected_profit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sold_roi: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expected_roi: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub recovery_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub ghost_estimated_revenue: Decimal,
    pub stats: BucketStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketStats {
    pub sold: usize,
    pub active: usize,
    pub missing: usize,
    pub damaged: usize,
    pub ghost: usize,
    pub blacklisted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDetails {
    /// ACTIVE listings, slowest movers first.
    pub on_shelf_aging: Vec<AgingEntry>,
    /// Actionable gaps only; damaged units are excluded by design.
    pub missing: Vec<MissingEntry>,
    pub ghost_inventory: Vec<GhostEntry>,
    pub trace: Vec<TraceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgingEntry {
    pub name: String,
    pub key: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissingEntry {
    pub name: String,
    pub key: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GhostEntry {
    pub name: String,
    pub key: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub listed_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_revenue: Decimal,
    pub status: String,
}

/// One trace row per purchase unit, plus a synthetic row per ghost listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceEntry {
    pub name: String,
    pub key: String,
    pub bucket: Bucket,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    /// True on SOLD rows: the profit is already in `current_profit` and must
    /// not be counted a second time by downstream consumers.
    pub settled: bool,
}

/// Assemble the report from the reconcile outcome and the (unrounded)
/// summary. All money figures round to two decimals here, at the boundary.
pub fn build(
    outcome: &ReconcileOutcome,
    summary: &FinancialSummary,
    blacklisted: usize,
    payout_rate: Decimal,
    now: DateTime<Local>,
) -> Report {
    let rounded = summary.rounded();

    let mut on_shelf_aging: Vec<AgingEntry> = outcome
        .units
        .iter()
        .filter(|u| u.bucket == Bucket::Active)
        .filter_map(|u| {
            u.sale.as_ref().map(|sale| AgingEntry {
                name: u.purchase.name.clone(),
                key: mask_key(&u.purchase.activation_key),
                price: sale.listed_price.round_dp(2),
                days: u.days_on_shelf,
            })
        })
        .collect();
    on_shelf_aging.sort_by(|a, b| b.days.cmp(&a.days).then_with(|| a.name.cmp(&b.name)));

    let missing = outcome
        .units
        .iter()
        .filter(|u| u.bucket == Bucket::Missing)
        .map(|u| MissingEntry {
            name: u.purchase.name.clone(),
            key: mask_key(&u.purchase.activation_key),
            cost: u.purchase.cost.round_dp(2),
        })
        .collect();

    let ghost_inventory = outcome
        .ghosts
        .iter()
        .map(|g| GhostEntry {
            name: g.name.clone(),
            key: mask_key(&g.activation_key),
            listed_price: g.listed_price.round_dp(2),
            estimated_revenue: (g.listed_price * payout_rate).round_dp(2),
            status: g.status.as_str().to_string(),
        })
        .collect();

    let mut trace: Vec<TraceEntry> = outcome
        .units
        .iter()
        .map(|u| {
            let revenue = match u.bucket {
                Bucket::Sold | Bucket::Active => u
                    .sale
                    .as_ref()
                    .map(|s| s.listed_price * payout_rate)
                    .unwrap_or(Decimal::ZERO),
                _ => Decimal::ZERO,
            };
            TraceEntry {
                name: u.purchase.name.clone(),
                key: mask_key(&u.purchase.activation_key),
                bucket: u.bucket,
                cost: u.purchase.cost.round_dp(2),
                estimated_revenue: revenue.round_dp(2),
                profit: (revenue - u.purchase.cost).round_dp(2),
                settled: u.bucket == Bucket::Sold,
            }
        })
        .collect();
    trace.extend(outcome.ghosts.iter().map(|g| {
        let revenue = (g.listed_price * payout_rate).round_dp(2);
        TraceEntry {
            name: g.name.clone(),
            key: mask_key(&g.activation_key),
            bucket: Bucket::Ghost,
            cost: Decimal::ZERO,
            estimated_revenue: revenue,
            // No cost basis: a ghost row carries no profit figure.
            profit: Decimal::ZERO,
            settled: false,
        }
    }));

    Report {
        update_at: now.format(LEDGER_TIME_FORMAT).to_string(),
        summary: ReportSummary {
            total_investment: rounded.total_investment,
            realized_cash: rounded.realized_cash,
            floating_asset: rounded.floating_asset,
            current_profit: rounded.current_profit,
            expected_profit: rounded.expected_profit,
            sold_roi: rounded.sold_roi,
            total_expected_roi: rounded.total_expected_roi,
            recovery_rate: rounded.recovery_rate,
            ghost_estimated_revenue: rounded.ghost_estimated_revenue,
            stats: BucketStats {
                sold: outcome.count(Bucket::Sold),
                active: outcome.count(Bucket::Active),
                missing: outcome.count(Bucket::Missing),
                damaged: outcome.count(Bucket::Damaged),
                ghost: outcome.ghosts.len(),
                blacklisted,
            },
        },
        details: ReportDetails { on_shelf_aging, missing, ghost_inventory, trace },
    }
}

impl Report {
    /// Zeroed report shape for the failure path, so dashboard consumers
    /// never see a missing field.
    pub fn skeleton(now: DateTime<Local>) -> Report {
        Report {
            update_at: now.format(LEDGER_TIME_FORMAT).to_string(),
            summary: ReportSummary {
                total_investment: Decimal::ZERO,
                realized_cash: Decimal::ZERO,
                floating_asset: Decimal::ZERO,
                current_profit: Decimal::ZERO,
                expected_profit: Decimal::ZERO,
                sold_roi: Decimal::ZERO,
                total_expected_roi: Decimal::ZERO,
                recovery_rate: Decimal::ZERO,
                ghost_estimated_revenue: Decimal::ZERO,
                stats: BucketStats::default(),
            },
            details: ReportDetails {
                on_shelf_aging: Vec::new(),
                missing: Vec::new(),
                ghost_inventory: Vec::new(),
                trace: Vec::new(),
            },
        }
    }

    /// Persist as the single latest-snapshot file. Full overwrite, never append.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }
}
