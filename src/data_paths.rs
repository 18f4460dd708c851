use std::path::{Path, PathBuf};

/// Default data directory (relative to current working directory)
pub const DEFAULT_DATA_DIR: &str = "./data";

pub const PURCHASE_LEDGER_FILE: &str = "purchase_ledger.json";
pub const SALE_LEDGER_FILE: &str = "sale_listings.json";
pub const BLACKLIST_FILE: &str = "blacklist.json";
pub const DAMAGED_REGISTRY_FILE: &str = "damaged_items.json";
pub const REPORT_FILE: &str = "finance_summary.json";
pub const CONFIG_FILE: &str = "audit_config.json";
pub const LOGS_DIR: &str = "logs";

/// Helper struct to manage the data directory layout
#[derive(Clone, Debug)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Purchase ledger written wholesale by the purchase-side scraper.
    pub fn purchase_ledger(&self) -> PathBuf {
        self.root.join(PURCHASE_LEDGER_FILE)
    }

    /// Marketplace listing snapshot written wholesale by the sale-side scraper.
    pub fn sale_ledger(&self) -> PathBuf {
        self.root.join(SALE_LEDGER_FILE)
    }

    pub fn blacklist(&self) -> PathBuf {
        self.root.join(BLACKLIST_FILE)
    }

    pub fn damaged_registry(&self) -> PathBuf {
        self.root.join(DAMAGED_REGISTRY_FILE)
    }

    /// The single latest-snapshot report artifact.
    pub fn report(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    pub fn audit_config(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Ensure the data and log directories exist
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.logs())?;
        Ok(())
    }
}
