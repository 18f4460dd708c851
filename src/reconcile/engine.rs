//! Key-based reconciliation of the purchase and sale ledgers
//!
//! Every purchase unit lands in exactly one lifecycle bucket; sale-side keys
//! with no purchase counterpart come out as ghost listings. The engine is a
//! pure function of its inputs: it mutates nothing, touches no files, and its
//! output does not depend on traversal order.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::ledger::damaged::DamagedRegistry;
use crate::ledger::types::{mask_key, PurchaseRecord, SaleRecord, SaleStatus};

/// Mutually exclusive lifecycle classification for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bucket {
    Sold,
    Active,
    Missing,
    Damaged,
    /// Sale-side only: a listing whose key has no purchase counterpart.
    Ghost,
}

/// One purchase unit with its bucket and, when matched, the sale record.
#[derive(Debug, Clone)]
pub struct ClassifiedUnit {
    pub purchase: PurchaseRecord,
    pub bucket: Bucket,
    pub sale: Option<SaleRecord>,
    /// Days since listing, populated for ACTIVE units only.
    pub days_on_shelf: i64,
}

/// Engine output: classified purchase units plus ghost listings.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    pub units: Vec<ClassifiedUnit>,
    pub ghosts: Vec<SaleRecord>,
}

impl ReconcileOutcome {
    pub fn count(&self, bucket: Bucket) -> usize {
        if bucket == Bucket::Ghost {
            return self.ghosts.len();
        }
        self.units.iter().filter(|u| u.bucket == bucket).count()
    }
}

/// Reconcile the two ledger snapshots against the damaged registry.
///
/// Classification runs on the canonical `SaleStatus` mapped at the ledger
/// boundary; a withdrawn listing counts the same as no listing at all, so the
/// unit falls through to MISSING (or DAMAGED). Key collisions inside either
/// ledger resolve last-write-wins and are logged as data-integrity warnings.
pub fn reconcile(
    purchases: &[PurchaseRecord],
    sales: &[SaleRecord],
    damaged: &DamagedRegistry,
    now: NaiveDateTime,
) -> ReconcileOutcome {
    let purchase_index = index_last_wins(purchases, |p| p.activation_key.as_str(), "purchase");
    let sale_index = index_last_wins(sales, |s| s.activation_key.as_str(), "sale");

    let mut outcome = ReconcileOutcome::default();

    // Units come out in first-seen key order so the trace is stable run to run.
    let mut seen = HashSet::new();
    for purchase in purchases {
        if !seen.insert(purchase.activation_key.as_str()) {
            continue;
        }
        // Last-write-wins: classify the index winner, not the earlier duplicate.
        let purchase = purchase_index[purchase.activation_key.as_str()];
        outcome.units.push(classify(purchase, &sale_index, damaged, now));
    }

    let mut ghost_seen = HashSet::new();
    for sale in sales {
        if purchase_index.contains_key(sale.activation_key.as_str()) {
            continue;
        }
        if !ghost_seen.insert(sale.activation_key.as_str()) {
            continue;
        }
        outcome.ghosts.push((*sale_index[sale.activation_key.as_str()]).clone());
    }

    outcome
}

fn classify(
    purchase: &PurchaseRecord,
    sale_index: &HashMap<&str, &SaleRecord>,
    damaged: &DamagedRegistry,
    now: NaiveDateTime,
) -> ClassifiedUnit {
    let listing = sale_index
        .get(purchase.activation_key.as_str())
        .copied()
        .filter(|s| s.status != SaleStatus::Withdrawn);

    match listing {
        Some(sale) if sale.status == SaleStatus::Sold => ClassifiedUnit {
            purchase: purchase.clone(),
            bucket: Bucket::Sold,
            sale: Some(sale.clone()),
            days_on_shelf: 0,
        },
        Some(sale) => ClassifiedUnit {
            purchase: purchase.clone(),
            bucket: Bucket::Active,
            sale: Some(sale.clone()),
            days_on_shelf: shelf_days(sale, now),
        },
        None => {
            let is_damaged = purchase.damaged || damaged.contains(&purchase.activation_key);
            ClassifiedUnit {
                purchase: purchase.clone(),
                bucket: if is_damaged { Bucket::Damaged } else { Bucket::Missing },
                sale: None,
                days_on_shelf: 0,
            }
        }
    }
}

fn shelf_days(sale: &SaleRecord, now: NaiveDateTime) -> i64 {
    sale.listed_at
        .map(|listed| (now - listed).num_days().max(0))
        .unwrap_or(0)
}

fn index_last_wins<'a, T, F>(records: &'a [T], key_of: F, side: &str) -> HashMap<&'a str, &'a T>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut index: HashMap<&str, &T> = HashMap::with_capacity(records.len());
    for record in records {
        let key = key_of(record);
        if index.insert(key, record).is_some() {
            warn!(side, key = %mask_key(key), "Duplicate activation key, keeping last occurrence");
        }
    }
    index
}
