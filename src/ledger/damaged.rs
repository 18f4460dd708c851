//! Damaged-unit registry and the single ledger write path
//!
//! A damaged unit is permanently unsellable: its cost stays in the books but
//! it must never show up in the actionable missing list. Marking a unit
//! damaged is the only operation that writes to the purchase ledger, and it
//! rewrites the whole file; serialization against concurrent writers is the
//! caller's responsibility.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::ledger::types::{mask_key, normalize_key, LEDGER_TIME_FORMAT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamagedEntry {
    pub key: String,
    pub name: String,
    pub marked_at: String,
    pub reason: String,
}

/// Set of keys marked permanently unsellable.
#[derive(Debug, Clone, Default)]
pub struct DamagedRegistry {
    entries: Vec<DamagedEntry>,
    keys: HashSet<String>,
}

impl DamagedRegistry {
    /// Fail-soft load: a missing or malformed registry is an empty one.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) if !contents.trim().is_empty() => contents,
            Ok(_) => return DamagedRegistry::default(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No damaged registry, starting empty");
                return DamagedRegistry::default();
            }
        };

        match serde_json::from_str::<Vec<DamagedEntry>>(&contents) {
            Ok(entries) => {
                let keys = entries.iter().map(|e| normalize_key(&e.key)).collect();
                DamagedRegistry { entries, keys }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed damaged registry, starting empty");
                DamagedRegistry::default()
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn entries(&self) -> &[DamagedEntry] {
        &self.entries
    }
}

/// How to locate the unit to mark inside the purchase ledger.
#[derive(Debug, Clone)]
pub enum UnitSelector {
    Uid(String),
    Key(String),
}

/// Flip the damaged flag on one purchase unit.
///
/// The ledger is edited as raw JSON rows so fields this crate does not model
/// survive the rewrite untouched. Returns the registry entry that was
/// appended (or already present).
pub fn mark_damaged(
    ledger_path: &Path,
    registry_path: &Path,
    selector: &UnitSelector,
    reason: &str,
    now: DateTime<Local>,
) -> Result<DamagedEntry> {
    let contents = std::fs::read_to_string(ledger_path)
        .with_context(|| format!("Cannot read purchase ledger {}", ledger_path.display()))?;
    let mut rows: Vec<Value> = serde_json::from_str(&contents)
        .with_context(|| format!("Purchase ledger {} is not a JSON array", ledger_path.display()))?;

    let mut found: Option<(String, String)> = None;
    for row in rows.iter_mut() {
        let matches = match selector {
            UnitSelector::Uid(uid) => row_str(row, "uid").as_deref() == Some(uid.as_str()),
            UnitSelector::Key(key) => {
                let wanted = normalize_key(key);
                row_key(row).map(|k| normalize_key(&k) == wanted).unwrap_or(false)
            }
        };
        if matches {
            // A unit with no key can never be reconciled; an empty registry
            // entry would match nothing, so refuse before touching the ledger.
            let Some(key) = row_key(row) else {
                bail!("Purchase unit matched {:?} carries no activation key", selector);
            };
            let name = row_str(row, "name").unwrap_or_default();
            row["damaged"] = Value::Bool(true);
            found = Some((key, name));
            break;
        }
    }

    let Some((key, name)) = found else {
        bail!("No purchase unit matched {:?}", selector);
    };

    let json = serde_json::to_string_pretty(&rows)?;
    std::fs::write(ledger_path, json)
        .with_context(|| format!("Failed to rewrite purchase ledger {}", ledger_path.display()))?;

    let normalized = normalize_key(&key);
    let registry = DamagedRegistry::load(registry_path);
    if registry.contains(&normalized) {
        info!(key = %mask_key(&normalized), "Unit already in damaged registry");
        let existing = registry
            .entries
            .iter()
            .find(|e| normalize_key(&e.key) == normalized)
            .cloned()
            .unwrap_or(DamagedEntry {
                key: normalized,
                name,
                marked_at: now.format(LEDGER_TIME_FORMAT).to_string(),
                reason: reason.to_string(),
            });
        return Ok(existing);
    }

    let entry = DamagedEntry {
        key: normalized,
        name,
        marked_at: now.format(LEDGER_TIME_FORMAT).to_string(),
        reason: reason.to_string(),
    };
    let mut entries = registry.entries;
    entries.push(entry.clone());
    if let Some(parent) = registry_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(registry_path, serde_json::to_string_pretty(&entries)?)
        .with_context(|| format!("Failed to write damaged registry {}", registry_path.display()))?;

    info!(key = %mask_key(&entry.key), name = %entry.name, "Unit marked damaged");
    Ok(entry)
}

fn row_str(row: &Value, field: &str) -> Option<String> {
    row.get(field).and_then(Value::as_str).map(str::to_string)
}

fn row_key(row: &Value) -> Option<String> {
    row_str(row, "activation_key").or_else(|| row_str(row, "cd_key"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_now() -> DateTime<Local> {
        "2026-08-24T12:00:00+00:00".parse::<DateTime<Local>>().unwrap()
    }

    #[test]
    fn test_mark_damaged_preserves_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("purchase_ledger.json");
        let registry = dir.path().join("damaged_items.json");
        std::fs::write(
            &ledger,
            r#"[
                {"uid": "u1", "name": "Game A", "activation_key": "AAAAA-11111", "cost": 10.0,
                 "scraper_note": "bundle of 2", "total_paid": 20.0},
                {"uid": "u2", "name": "Game B", "cd_key": "BBBBB-22222", "cost": 8.0}
            ]"#,
        )
        .unwrap();

        let entry = mark_damaged(
            &ledger,
            &registry,
            &UnitSelector::Uid("u1".to_string()),
            "customer reported dead key",
            local_now(),
        )
        .unwrap();
        assert_eq!(entry.key, "AAAAA-11111");
        assert_eq!(entry.name, "Game A");

        let rewritten: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&ledger).unwrap()).unwrap();
        assert_eq!(rewritten[0]["damaged"], Value::Bool(true));
        // Fields the auditor does not model must survive the rewrite.
        assert_eq!(rewritten[0]["scraper_note"], "bundle of 2");
        assert_eq!(rewritten[0]["total_paid"], 20.0);
        assert!(rewritten[1].get("damaged").is_none());

        let reloaded = DamagedRegistry::load(&registry);
        assert!(reloaded.contains("AAAAA-11111"));
    }

    #[test]
    fn test_mark_damaged_by_key_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("purchase_ledger.json");
        let registry = dir.path().join("damaged_items.json");
        std::fs::write(
            &ledger,
            r#"[{"uid": "u1", "name": "Game A", "cd_key": "aaaaa-11111", "cost": 10.0}]"#,
        )
        .unwrap();

        mark_damaged(&ledger, &registry, &UnitSelector::Key("AAAAA-11111".into()), "dead", local_now())
            .unwrap();
        mark_damaged(&ledger, &registry, &UnitSelector::Key("aaaaa-11111".into()), "dead", local_now())
            .unwrap();

        let entries = DamagedRegistry::load(&registry);
        assert_eq!(entries.entries().len(), 1);
    }

    #[test]
    fn test_mark_damaged_keyless_row_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("purchase_ledger.json");
        let registry = dir.path().join("damaged_items.json");
        let original = r#"[{"uid": "u1", "name": "Keyless Row", "cost": 10.0}]"#;
        std::fs::write(&ledger, original).unwrap();

        let result = mark_damaged(
            &ledger,
            &registry,
            &UnitSelector::Uid("u1".into()),
            "dead",
            local_now(),
        );
        assert!(result.is_err());
        // Neither file is touched: the ledger keeps its bytes and no
        // empty-key registry entry appears.
        assert_eq!(std::fs::read_to_string(&ledger).unwrap(), original);
        assert!(!registry.exists());
    }

    #[test]
    fn test_mark_damaged_unknown_unit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("purchase_ledger.json");
        std::fs::write(&ledger, "[]").unwrap();
        let result = mark_damaged(
            &ledger,
            &dir.path().join("damaged_items.json"),
            &UnitSelector::Uid("missing".into()),
            "dead",
            local_now(),
        );
        assert!(result.is_err());
    }
}
