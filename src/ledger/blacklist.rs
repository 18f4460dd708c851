//! Blacklist configuration for keys excluded from reconciliation
//!
//! Two on-disk shapes are accepted: the current object form
//! `{"entries": [{"key": ..., "side": ...}]}` and the legacy flat array of
//! keys, which applies to both sides and is normalized silently.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::ledger::types::normalize_key;

/// Which ledger a blacklist entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BlacklistSide {
    Purchase,
    Sale,
    Both,
}

fn default_side() -> BlacklistSide {
    BlacklistSide::Both
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub key: String,
    #[serde(default = "default_side")]
    pub side: BlacklistSide,
}

#[derive(Serialize, Deserialize)]
struct BlacklistFileModern {
    entries: Vec<BlacklistEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BlacklistFile {
    Modern(BlacklistFileModern),
    Legacy(Vec<String>),
}

/// In-memory blacklist with per-side key sets. Keys are normalized once at
/// construction so lookups never re-normalize.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    entries: Vec<BlacklistEntry>,
    purchase_keys: HashSet<String>,
    sale_keys: HashSet<String>,
}

impl Blacklist {
    pub fn from_entries(raw: Vec<BlacklistEntry>) -> Self {
        let mut blacklist = Blacklist::default();
        for entry in raw {
            blacklist.add(&entry.key, entry.side);
        }
        blacklist
    }

    /// Load from disk. Any failure degrades to an empty blacklist; the
    /// blacklist is ancillary and must never abort a run.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No blacklist file, starting empty");
                return Blacklist::default();
            }
        };

        match serde_json::from_str::<BlacklistFile>(&contents) {
            Ok(BlacklistFile::Modern(file)) => Blacklist::from_entries(file.entries),
            Ok(BlacklistFile::Legacy(keys)) => {
                debug!(count = keys.len(), "Normalizing legacy flat blacklist format");
                Blacklist::from_entries(
                    keys.into_iter()
                        .map(|key| BlacklistEntry { key, side: BlacklistSide::Both })
                        .collect(),
                )
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed blacklist file, starting empty");
                Blacklist::default()
            }
        }
    }

    /// Persist in the current object shape, full overwrite.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = BlacklistFileModern { entries: self.entries.clone() };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write blacklist to {}", path.display()))?;
        Ok(())
    }

    pub fn add(&mut self, key: &str, side: BlacklistSide) {
        let key = normalize_key(key);
        if key.is_empty() {
            return;
        }
        match side {
            BlacklistSide::Purchase => {
                self.purchase_keys.insert(key.clone());
            }
            BlacklistSide::Sale => {
                self.sale_keys.insert(key.clone());
            }
            BlacklistSide::Both => {
                self.purchase_keys.insert(key.clone());
                self.sale_keys.insert(key.clone());
            }
        }
        self.entries.retain(|e| normalize_key(&e.key) != key || e.side != side);
        self.entries.push(BlacklistEntry { key, side });
    }

    pub fn blocks_purchase(&self, key: &str) -> bool {
        self.purchase_keys.contains(key)
    }

    pub fn blocks_sale(&self, key: &str) -> bool {
        self.sale_keys.contains(key)
    }

    pub fn entries(&self) -> &[BlacklistEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
