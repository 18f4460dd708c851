//! Ledger record types and the free-text status boundary
//!
//! All business-meaning text coming from the two ledger files is translated
//! into closed enums here, at load time. The reconciliation engine never
//! inspects raw status strings.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The one status token that means a unit left the shelf with money received.
pub const SOLD_STATUS_TOKEN: &str = "shipped/out-of-stock";

/// Tokens meaning the listing was taken down without a sale.
const WITHDRAWN_STATUS_TOKENS: &[&str] = &["withdrawn", "closed", "delisted"];

/// Tokens known to mean "still listed". Anything else non-withdrawn is also
/// treated as listed, but gets a data-integrity warning.
const KNOWN_ACTIVE_TOKENS: &[&str] = &["on-sale", "listed", "pending-shipment"];

/// Substring marker used by the purchase-side scraper for refunded orders.
const REFUND_MARKER: &str = "refund";

/// Activation keys at or below this length are scraper placeholders, not
/// redeemable keys.
pub const MIN_KEY_LEN: usize = 6;

/// Timestamp format used by both ledger producers.
pub const LEDGER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Purchase order status after boundary mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Valid,
    Refunded,
}

impl PurchaseStatus {
    /// The purchase ledger carries free text; the scraper tags refunded
    /// orders with a marker substring.
    pub fn from_token(raw: &str) -> Self {
        if raw.to_lowercase().contains(REFUND_MARKER) {
            PurchaseStatus::Refunded
        } else {
            PurchaseStatus::Valid
        }
    }
}

/// Sale listing status after boundary mapping.
///
/// `Sold` requires the exact sold token. A listing in pre-shipment limbo
/// stays `Active` until the marketplace flips it to the sold token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Sold,
    Active,
    Withdrawn,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Sold => "SOLD",
            SaleStatus::Active => "ACTIVE",
            SaleStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn from_token(raw: &str) -> Self {
        let token = raw.trim();
        if token == SOLD_STATUS_TOKEN {
            return SaleStatus::Sold;
        }
        let lower = token.to_lowercase();
        if WITHDRAWN_STATUS_TOKENS.contains(&lower.as_str()) {
            return SaleStatus::Withdrawn;
        }
        if !KNOWN_ACTIVE_TOKENS.contains(&lower.as_str()) {
            warn!(status = %token, "Unmapped sale status token, treating as active listing");
        }
        SaleStatus::Active
    }
}

/// One purchased unit, already filtered and normalized by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub order_id: String,
    pub uid: String,
    pub name: String,
    pub activation_key: String,
    pub cost: Decimal,
    pub status: PurchaseStatus,
    pub damaged: bool,
}

/// One marketplace listing (or completed sale) from the sale-side snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub activation_key: String,
    pub name: String,
    pub listed_price: Decimal,
    pub status: SaleStatus,
    pub listed_at: Option<NaiveDateTime>,
}

/// Canonical form for activation keys across both ledgers, the blacklist and
/// the damaged registry. Matching is case-insensitive.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// True when the key is long enough to be a real redemption code rather than
/// an empty/placeholder cell.
pub fn is_real_key(key: &str) -> bool {
    key.trim().chars().count() >= MIN_KEY_LEN
}

/// Redacted key form used everywhere in the report and in log output.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 3..].iter().collect();
        format!("{}***{}", head, tail)
    } else {
        "***".to_string()
    }
}

/// Strip currency symbols and whitespace from a scraped price cell.
/// Anything that still fails to parse counts as zero, matching the
/// fail-soft posture of the loaders.
pub fn sanitize_money(raw: &str) -> Decimal {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}
