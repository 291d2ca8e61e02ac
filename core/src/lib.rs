//! Fraud and customer-segmentation analytics over PaySim-style banking
//! transactions.
//!
//! Data flows one way: ingest → store → aggregator / segmentation /
//! fraud scorer → report → export. Only `store` touches SQLite and only
//! `export` and `ingest` touch files.

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod fraud_scorer;
pub mod ingest;
pub mod report;
pub mod rng;
pub mod segmentation;
pub mod store;
pub mod synth;
pub mod transaction;
pub mod types;

pub use config::AnalyticsConfig;
pub use engine::ReportEngine;
pub use error::{AnalyticsError, AnalyticsResult};
pub use transaction::{Transaction, TxnType};
