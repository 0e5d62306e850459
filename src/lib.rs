// Cashbook Dashboard - Core Library
// Exposes the aggregator for the CLI, the terminal dashboard and the API server

pub mod config;
pub mod conclusion;
pub mod db;
pub mod error;
pub mod report;
pub mod schema;     // Shape Layer - column layout detection
pub mod session;

// Only compile the dashboard when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod api;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use conclusion::{conclude, format_amount};
pub use db::TableDescriptor;
pub use error::{EmptyState, ReportError};
pub use report::{
    Aggregator, DailyIncome, DateRange, ExpenseTotal, MonthlyTotal, PartyFilter, PartyTotal,
    Report, ReportMode, ReportQuery, ReportRows,
    inspect_tables, list_parties, run_report,
};
pub use schema::{ColumnLayout, NormalizationRule};
pub use session::Session;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
