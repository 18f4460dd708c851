//! Reconciliation engine and financial aggregation.

pub mod aggregate;
pub mod engine;

pub use aggregate::{aggregate, BucketCosts, ConservationBreach, FinancialSummary};
pub use engine::{reconcile, Bucket, ClassifiedUnit, ReconcileOutcome};
