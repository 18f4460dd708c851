//! Financial aggregation over classified units
//!
//! All accumulation happens in `Decimal`; figures are rounded to two decimal
//! places only at the summary boundary. Ghost listings contribute an
//! informational revenue estimate and nothing else.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::reconcile::engine::{Bucket, ReconcileOutcome};

/// Cost totals per bucket, kept unrounded for the conservation check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketCosts {
    pub sold: Decimal,
    pub active: Decimal,
    pub missing: Decimal,
    pub damaged: Decimal,
}

impl BucketCosts {
    pub fn sum(&self) -> Decimal {
        self.sold + self.active + self.missing + self.damaged
    }
}

/// Aggregate figures for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialSummary {
    /// Σ cost over every non-excluded purchase unit.
    pub total_investment: Decimal,
    /// Payout-adjusted proceeds of SOLD units.
    pub realized_cash: Decimal,
    /// Payout-adjusted value of ACTIVE listings.
    pub floating_asset: Decimal,
    /// realized_cash − cost of SOLD units.
    pub current_profit: Decimal,
    /// (realized_cash + floating_asset) − total_investment.
    pub expected_profit: Decimal,
    pub sold_roi: Decimal,
    pub total_expected_roi: Decimal,
    /// realized_cash as a percentage of total_investment.
    pub recovery_rate: Decimal,
    /// Informational only, never part of any money total.
    pub ghost_estimated_revenue: Decimal,
    pub bucket_costs: BucketCosts,
}

/// Raised only under the `block` conservation policy.
#[derive(Debug, Error)]
#[error("cost conservation drift {drift} exceeds epsilon {epsilon}")]
pub struct ConservationBreach {
    pub drift: Decimal,
    pub epsilon: Decimal,
}

/// Fold the reconcile outcome into the summary figures.
pub fn aggregate(outcome: &ReconcileOutcome, payout_rate: Decimal) -> FinancialSummary {
    let mut total_investment = Decimal::ZERO;
    let mut realized_cash = Decimal::ZERO;
    let mut floating_asset = Decimal::ZERO;
    let mut costs = BucketCosts::default();

    for unit in &outcome.units {
        let cost = unit.purchase.cost;
        total_investment += cost;
        match unit.bucket {
            Bucket::Sold => {
                costs.sold += cost;
                if let Some(sale) = &unit.sale {
                    realized_cash += sale.listed_price * payout_rate;
                }
            }
            Bucket::Active => {
                costs.active += cost;
                if let Some(sale) = &unit.sale {
                    floating_asset += sale.listed_price * payout_rate;
                }
            }
            Bucket::Missing => costs.missing += cost,
            Bucket::Damaged => costs.damaged += cost,
            Bucket::Ghost => unreachable!("engine never assigns Ghost to a purchase unit"),
        }
    }

    let ghost_estimated_revenue: Decimal =
        outcome.ghosts.iter().map(|g| g.listed_price * payout_rate).sum();

    let current_profit = realized_cash - costs.sold;
    let expected_profit = (realized_cash + floating_asset) - total_investment;

    FinancialSummary {
        total_investment,
        realized_cash,
        floating_asset,
        current_profit,
        expected_profit,
        sold_roi: safe_ratio(current_profit, costs.sold),
        total_expected_roi: safe_ratio(expected_profit, total_investment),
        recovery_rate: safe_ratio(realized_cash, total_investment) * Decimal::ONE_HUNDRED,
        ghost_estimated_revenue,
        bucket_costs: costs,
    }
}

impl FinancialSummary {
    /// Absolute gap between the per-bucket cost partition and the investment
    /// total. Anything beyond epsilon is a data-integrity problem.
    pub fn conservation_drift(&self) -> Decimal {
        (self.bucket_costs.sum() - self.total_investment).abs()
    }

    /// Check the cost-conservation invariant, logging a warning on breach.
    /// Returns the breach so the caller can apply its configured policy.
    pub fn check_conservation(&self, epsilon: Decimal) -> Result<(), ConservationBreach> {
        let drift = self.conservation_drift();
        if drift > epsilon {
            warn!(%drift, %epsilon, "Cost conservation invariant violated");
            return Err(ConservationBreach { drift, epsilon });
        }
        Ok(())
    }

    /// Round the money and ratio figures for the report boundary.
    pub fn rounded(&self) -> FinancialSummary {
        let dp = |v: Decimal| v.round_dp(2);
        FinancialSummary {
            total_investment: dp(self.total_investment),
            realized_cash: dp(self.realized_cash),
            floating_asset: dp(self.floating_asset),
            current_profit: dp(self.current_profit),
            expected_profit: dp(self.expected_profit),
            sold_roi: self.sold_roi.round_dp(4),
            total_expected_roi: self.total_expected_roi.round_dp(4),
            recovery_rate: self.recovery_rate.round_dp(2),
            ghost_estimated_revenue: dp(self.ghost_estimated_revenue),
            bucket_costs: self.bucket_costs.clone(),
        }
    }
}

fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}
