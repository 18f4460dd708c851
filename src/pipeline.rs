//! The audit pipeline: Loader → Reconciliation Engine → Aggregator → Report
//!
//! Propagation policy: no loader or config error escapes. The pipeline always
//! comes back with a report — a zeroed skeleton in the worst case — so that
//! report consumers never crash on a missing field. The single exception is a
//! cost-conservation breach under the `block` policy, which withholds the
//! report and surfaces as an error.

use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::config::{AuditConfig, BreachPolicy};
use crate::data_paths::DataPaths;
use crate::ledger::{load_purchases, load_sales, Blacklist, DamagedRegistry};
use crate::reconcile::{aggregate, reconcile};
use crate::report::{build, Report};

/// Run the full audit against the ledger snapshot under `paths` and persist
/// the report.
///
/// The caller is expected to hold whatever external lock serializes this
/// against the scraping producers; the pipeline itself only reads, except
/// for the report overwrite at the end.
pub fn run(paths: &DataPaths, config: &AuditConfig, now: DateTime<Local>) -> Result<Report> {
    match run_inner(paths, config, now) {
        Ok(report) => Ok(report),
        Err(e) => {
            if e.is::<crate::reconcile::ConservationBreach>() {
                return Err(e);
            }
            // Internal defect: log it and still hand consumers a full shape.
            error!(error = %e, "Audit pipeline failed, emitting skeleton report");
            let skeleton = Report::skeleton(now);
            if let Err(save_err) = skeleton.save(&paths.report()) {
                error!(error = %save_err, "Could not persist skeleton report");
            }
            Ok(skeleton)
        }
    }
}

fn run_inner(paths: &DataPaths, config: &AuditConfig, now: DateTime<Local>) -> Result<Report> {
    let blacklist = Blacklist::load(&paths.blacklist());
    let damaged = DamagedRegistry::load(&paths.damaged_registry());

    let purchases = load_purchases(&paths.purchase_ledger(), &blacklist);
    let sales = load_sales(&paths.sale_ledger(), &blacklist);
    let blacklisted = purchases.blacklisted + sales.blacklisted;

    let outcome = reconcile(&purchases.records, &sales.records, &damaged, now.naive_local());
    let summary = aggregate(&outcome, config.payout_rate);

    if let Err(breach) = summary.check_conservation(config.conservation_epsilon) {
        if config.on_conservation_breach == BreachPolicy::Block {
            return Err(breach.into());
        }
        // Log-only policy: the warning is already on the operational log.
    }

    let report = build(&outcome, &summary, blacklisted, config.payout_rate, now);
    report.save(&paths.report())?;

    info!(
        units = outcome.units.len(),
        ghosts = outcome.ghosts.len(),
        total_investment = %report.summary.total_investment,
        recovery_rate = %report.summary.recovery_rate,
        "Audit complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::BucketStats;
    use rust_decimal_macros::dec;

    fn fixed_now() -> DateTime<Local> {
        "2026-08-24T12:00:00+00:00".parse::<DateTime<Local>>().unwrap()
    }

    fn seed(dir: &tempfile::TempDir) -> DataPaths {
        let paths = DataPaths::new(dir.path());
        std::fs::write(
            paths.purchase_ledger(),
            r#"[
                {"order_id": "1001", "uid": "u1", "name": "Sold Game",
                 "activation_key": "K1-AAAA-BBBB", "cost": "¥10.00", "status": "completed"},
                {"order_id": "1002", "uid": "u2", "name": "Lost Game",
                 "activation_key": "K2-AAAA-BBBB", "cost": 15.0, "status": "completed"},
                {"order_id": "1003", "uid": "u3", "name": "Dead Key",
                 "activation_key": "K4-AAAA-BBBB", "cost": 8.0, "status": "completed", "damaged": true},
                {"order_id": "1004", "uid": "u4", "name": "Refunded",
                 "activation_key": "K8-AAAA-BBBB", "cost": 99.0, "status": "refund issued"}
            ]"#,
        )
        .unwrap();
        std::fs::write(
            paths.sale_ledger(),
            r#"[
                {"cd_key": "K1-AAAA-BBBB", "name": "Sold Game", "my_price": 20.0,
                 "status": "shipped/out-of-stock", "order_time": "2026-08-01 10:00:00"},
                {"cd_key": "K3-AAAA-BBBB", "name": "Ghost Listing", "my_price": 30.0,
                 "status": "listed", "order_time": "2026-08-10 10:00:00"}
            ]"#,
        )
        .unwrap();
        paths
    }

    #[test]
    fn test_end_to_end_audit() {
        let dir = tempfile::tempdir().unwrap();
        let paths = seed(&dir);

        let report = run(&paths, &AuditConfig::default(), fixed_now()).unwrap();

        assert_eq!(report.summary.total_investment, dec!(33.00));
        assert_eq!(report.summary.realized_cash, dec!(19.40));
        assert_eq!(report.summary.current_profit, dec!(9.40));
        assert_eq!(
            report.summary.stats,
            BucketStats { sold: 1, active: 0, missing: 1, damaged: 1, ghost: 1, blacklisted: 0 }
        );
        assert_eq!(report.details.missing.len(), 1);
        assert_eq!(report.details.missing[0].name, "Lost Game");
        assert!(paths.report().exists());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = seed(&dir);
        let now = fixed_now();

        let first = run(&paths, &AuditConfig::default(), now).unwrap();
        let first_bytes = std::fs::read(paths.report()).unwrap();
        let second = run(&paths, &AuditConfig::default(), now).unwrap();
        let second_bytes = std::fs::read(paths.report()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn test_empty_data_dir_yields_zeroed_report() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());

        let report = run(&paths, &AuditConfig::default(), fixed_now()).unwrap();
        assert_eq!(report.summary.total_investment, dec!(0));
        assert!(report.details.trace.is_empty());
        // A best-effort report is still persisted.
        assert!(paths.report().exists());
    }

    #[test]
    fn test_block_policy_withholds_report() {
        let dir = tempfile::tempdir().unwrap();
        let paths = seed(&dir);
        // A negative epsilon turns every run into a breach, so the policy
        // path gets exercised with well-formed ledgers.
        let config = AuditConfig {
            conservation_epsilon: dec!(-1),
            on_conservation_breach: BreachPolicy::Block,
            ..AuditConfig::default()
        };

        let err = run(&paths, &config, fixed_now()).unwrap_err();
        assert!(err.is::<crate::reconcile::ConservationBreach>());
        // Blocked means blocked: no report file on disk.
        assert!(!paths.report().exists());

        let config = AuditConfig { on_conservation_breach: BreachPolicy::Log, ..config };
        let report = run(&paths, &config, fixed_now()).unwrap();
        assert_eq!(report.summary.total_investment, dec!(33.00));
        assert!(paths.report().exists());
    }

    #[test]
    fn test_blacklist_excluded_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let paths = seed(&dir);
        std::fs::write(paths.blacklist(), r#"["K2-AAAA-BBBB"]"#).unwrap();

        let report = run(&paths, &AuditConfig::default(), fixed_now()).unwrap();
        // The blacklisted unit drops out of every bucket and every total.
        assert_eq!(report.summary.total_investment, dec!(18.00));
        assert!(report.details.missing.is_empty());
        assert_eq!(report.summary.stats.blacklisted, 1);
        assert!(!report.details.trace.iter().any(|t| t.name == "Lost Game"));
    }
}
