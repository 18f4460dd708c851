pub mod cli;
pub mod config;
pub mod data_paths;
pub use data_paths as data;
pub mod ledger;
pub mod logging;
pub mod pipeline;
pub mod reconcile;
pub mod report;
