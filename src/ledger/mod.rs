//! Ledger input layer: record types, fail-soft loaders, blacklist and
//! damaged-unit configuration.

pub mod blacklist;
pub mod damaged;
pub mod loader;
pub mod types;

pub use blacklist::{Blacklist, BlacklistEntry, BlacklistSide};
pub use damaged::{mark_damaged, DamagedEntry, DamagedRegistry, UnitSelector};
pub use loader::{load_purchases, load_sales, PurchaseLoad, SaleLoad};
pub use types::{PurchaseRecord, PurchaseStatus, SaleRecord, SaleStatus};
