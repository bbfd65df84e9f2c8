//! # Fraudwatch Warehouse
//!
//! Query-and-cache layer of the fraud monitoring dashboard.
//!
//! ## Overview
//!
//! The warehouse holds pre-aggregated reporting views; this crate only reads
//! them. It provides:
//!
//! - 🔌 **Connection holder**: one lazily opened connection, probed before
//!   reuse and replaced when the probe fails
//! - ⚡ **Query cache**: results keyed by query text and bound values, valid
//!   for a fixed TTL, cleared wholesale on refresh or failure
//! - 🛡️ **Fail-soft execution**: a failing query yields an empty result plus
//!   a diagnostic instead of an error
//! - 🔒 **Parameterized reports**: filter values are bound, never interpolated
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fraudwatch_warehouse::{ReadThroughQueryService, ReportCatalog, ReportView, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WarehouseConfig::load_default()?;
//!     let service = ReadThroughQueryService::open(&config)?;
//!     let catalog = ReportCatalog::new(config.schema.clone())?;
//!
//!     let outcome = service.run(&catalog.view(ReportView::FraudSummary))?;
//!     if let Some(failure) = &outcome.failure {
//!         eprintln!("{}\n{}", failure.message, failure.query);
//!     }
//!     println!("{} rows", outcome.data.row_count());
//!
//!     service.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Views
//!
//! | View | Description |
//! |------|-------------|
//! | `VW_TABLEAU_FRAUD_SUMMARY` | Headline metrics as name/value pairs |
//! | `VW_TABLEAU_DAILY_TRENDS` | Daily transaction and flagged counts |
//! | `VW_TABLEAU_ALERT_DISTRIBUTION` | Alerts per alert type |
//! | `VW_TABLEAU_CUSTOMER_SEGMENTS` | Fraud rate per customer segment |
//! | `VW_TABLEAU_GEOGRAPHIC_RISK` | Fraud rate per location |
//! | `VW_TABLEAU_TIME_PATTERNS` | Hourly transaction and fraud patterns |
//! | `VW_KYC_RISK_ANALYSIS` | Customers by risk category and KYC status |

pub mod cache;
pub mod config;
pub mod connection;
pub mod duckdb;
pub mod error;
pub mod query;
pub mod reports;
pub mod service;
pub mod tabular;

pub use cache::{CacheStats, CacheStatus, QueryCache};
pub use config::WarehouseConfig;
pub use connection::{ConnectionHolder, Connector, HeldConnection, WarehouseConnection};
pub use duckdb::{AccessMode, DuckDbConnection, DuckDbConnector};
pub use error::WarehouseError;
pub use query::{Query, QueryKey, SqlParam};
pub use reports::{
    AlertFilter, AlertSeverity, AlertStatus, AlertType, CustomerRiskFilter, FilterOption,
    KycStatus, ReportCatalog, ReportView, RiskCategory, TransactionFilter,
};
pub use service::{QueryFailure, QueryOutcome, ReadThroughQueryService, ServiceSettings};
pub use tabular::{Column, TabularResult};
