//! Fail-soft loaders for the two primary ledgers
//!
//! Contract: loading never raises. A missing or malformed ledger file is
//! logged and comes back as an empty collection, so the pipeline can always
//! emit a best-effort report.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::blacklist::Blacklist;
use crate::ledger::types::{
    is_real_key, normalize_key, sanitize_money, PurchaseRecord, PurchaseStatus, SaleRecord,
    SaleStatus, LEDGER_TIME_FORMAT,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ledger file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger file malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Price cells arrive either as JSON numbers or as scraped text with
/// currency symbols. Anything unparseable counts as zero.
#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyCell {
    Number(Decimal),
    Text(String),
    Other(serde_json::Value),
}

impl MoneyCell {
    fn into_decimal(self) -> Decimal {
        match self {
            MoneyCell::Number(value) => value,
            MoneyCell::Text(text) => sanitize_money(&text),
            MoneyCell::Other(_) => Decimal::ZERO,
        }
    }
}

impl Default for MoneyCell {
    fn default() -> Self {
        MoneyCell::Number(Decimal::ZERO)
    }
}

/// Raw purchase row as the scraping producer writes it.
#[derive(Deserialize)]
struct RawPurchaseRow {
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    uid: String,
    #[serde(default)]
    name: String,
    #[serde(default, alias = "cd_key")]
    activation_key: String,
    #[serde(default)]
    cost: MoneyCell,
    #[serde(default)]
    status: String,
    #[serde(default)]
    damaged: bool,
}

/// Raw sale row as the marketplace snapshot writes it.
#[derive(Deserialize)]
struct RawSaleRow {
    #[serde(default, alias = "cd_key")]
    activation_key: String,
    #[serde(default)]
    name: String,
    #[serde(default, alias = "my_price")]
    listed_price: MoneyCell,
    #[serde(default)]
    status: String,
    #[serde(default, alias = "order_time")]
    listing_timestamp: String,
}

/// Purchase-side load result with the drop tallies the report surfaces.
#[derive(Debug, Default)]
pub struct PurchaseLoad {
    pub records: Vec<PurchaseRecord>,
    pub refunded: usize,
    pub blacklisted: usize,
    pub keyless: usize,
}

/// Sale-side load result.
#[derive(Debug, Default)]
pub struct SaleLoad {
    pub records: Vec<SaleRecord>,
    pub blacklisted: usize,
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load the purchase ledger, dropping refunded, blacklisted and keyless rows.
pub fn load_purchases(path: &Path, blacklist: &Blacklist) -> PurchaseLoad {
    let rows: Vec<RawPurchaseRow> = match read_rows(path) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Purchase ledger unavailable, proceeding with empty collection");
            return PurchaseLoad::default();
        }
    };

    let total = rows.len();
    let mut load = PurchaseLoad::default();
    for row in rows {
        if PurchaseStatus::from_token(&row.status) == PurchaseStatus::Refunded {
            load.refunded += 1;
            continue;
        }
        let key = normalize_key(&row.activation_key);
        if !is_real_key(&key) {
            load.keyless += 1;
            continue;
        }
        if blacklist.blocks_purchase(&key) {
            load.blacklisted += 1;
            continue;
        }
        load.records.push(PurchaseRecord {
            order_id: row.order_id,
            uid: row.uid,
            name: row.name,
            activation_key: key,
            cost: row.cost.into_decimal(),
            status: PurchaseStatus::Valid,
            damaged: row.damaged,
        });
    }

    info!(
        path = %path.display(),
        total,
        kept = load.records.len(),
        refunded = load.refunded,
        blacklisted = load.blacklisted,
        keyless = load.keyless,
        "Purchase ledger loaded"
    );
    load
}

/// Load the sale ledger, dropping sale-side blacklisted rows and mapping
/// free-text statuses to the closed enum.
pub fn load_sales(path: &Path, blacklist: &Blacklist) -> SaleLoad {
    let rows: Vec<RawSaleRow> = match read_rows(path) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Sale ledger unavailable, proceeding with empty collection");
            return SaleLoad::default();
        }
    };

    let total = rows.len();
    let mut load = SaleLoad::default();
    for row in rows {
        let key = normalize_key(&row.activation_key);
        if blacklist.blocks_sale(&key) {
            load.blacklisted += 1;
            continue;
        }
        let listed_at = parse_listing_time(&row.listing_timestamp);
        load.records.push(SaleRecord {
            activation_key: key,
            name: row.name,
            listed_price: row.listed_price.into_decimal(),
            status: SaleStatus::from_token(&row.status),
            listed_at,
        });
    }

    info!(
        path = %path.display(),
        total,
        kept = load.records.len(),
        blacklisted = load.blacklisted,
        "Sale ledger loaded"
    );
    load
}

fn parse_listing_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match NaiveDateTime::parse_from_str(trimmed, LEDGER_TIME_FORMAT) {
        Ok(ts) => Some(ts),
        Err(_) => {
            warn!(timestamp = %trimmed, "Unparseable listing timestamp, aging will read as zero");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::blacklist::BlacklistSide;
    use rust_decimal_macros::dec;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let load = load_purchases(&dir.path().join("nope.json"), &Blacklist::default());
        assert!(load.records.is_empty());
    }

    #[test]
    fn test_malformed_json_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "purchase_ledger.json", "{broken");
        let load = load_purchases(&path, &Blacklist::default());
        assert!(load.records.is_empty());

        let path = write(&dir, "sales.json", "[{\"name\": ]");
        let load = load_sales(&path, &Blacklist::default());
        assert!(load.records.is_empty());
    }

    #[test]
    fn test_purchase_filters_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "purchase_ledger.json",
            r#"[
                {"uid": "u1", "name": "Keeper", "cd_key": "AAAAA-11111", "cost": "¥19.90", "status": "completed"},
                {"uid": "u2", "name": "Refund", "activation_key": "BBBBB-22222", "cost": 5.0, "status": "refund pending"},
                {"uid": "u3", "name": "NoKey", "activation_key": "n/a", "cost": 5.0, "status": "completed"},
                {"uid": "u4", "name": "Blocked", "activation_key": "CCCCC-33333", "cost": 5.0, "status": "completed"}
            ]"#,
        );
        let mut blacklist = Blacklist::default();
        blacklist.add("CCCCC-33333", BlacklistSide::Purchase);

        let load = load_purchases(&path, &blacklist);
        assert_eq!(load.records.len(), 1);
        assert_eq!(load.records[0].activation_key, "AAAAA-11111");
        assert_eq!(load.records[0].cost, dec!(19.90));
        assert_eq!(load.refunded, 1);
        assert_eq!(load.keyless, 1);
        assert_eq!(load.blacklisted, 1);
    }

    #[test]
    fn test_sale_status_mapped_at_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "sales.json",
            r#"[
                {"cd_key": "AAAAA-11111", "name": "Sold", "my_price": 20.0,
                 "status": "shipped/out-of-stock", "order_time": "2026-08-01 10:00:00"},
                {"cd_key": "BBBBB-22222", "name": "Pending", "my_price": 15.0,
                 "status": "pending-shipment", "order_time": "2026-08-10 10:00:00"},
                {"cd_key": "CCCCC-33333", "name": "Gone", "my_price": 9.0,
                 "status": "closed", "order_time": "not a timestamp"}
            ]"#,
        );
        let load = load_sales(&path, &Blacklist::default());
        assert_eq!(load.records.len(), 3);
        assert_eq!(load.records[0].status, SaleStatus::Sold);
        assert_eq!(load.records[1].status, SaleStatus::Active);
        assert_eq!(load.records[2].status, SaleStatus::Withdrawn);
        assert!(load.records[0].listed_at.is_some());
        assert!(load.records[2].listed_at.is_none());
    }

    #[test]
    fn test_sale_blacklist_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "sales.json",
            r#"[{"cd_key": "ddddd-44444", "name": "Blocked", "my_price": 9.0, "status": "listed"}]"#,
        );
        let mut blacklist = Blacklist::default();
        blacklist.add("DDDDD-44444", BlacklistSide::Sale);

        let load = load_sales(&path, &blacklist);
        assert!(load.records.is_empty());
        assert_eq!(load.blacklisted, 1);
    }
}
