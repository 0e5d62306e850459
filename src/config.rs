// ⚙️ Configuration - where the cooperative's books live and what to look for
//
// Defaults match the cooperative's accounting database; every field can be
// overridden from the command line or the CASHBOOK_* environment variables.

use crate::report::DateRange;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Default database file name
pub const DEFAULT_DB_PATH: &str = "contabilidad.db";

/// Cashbook tables share this prefix (caja2020, caja_prestamos, ...)
pub const DEFAULT_TABLE_PREFIX: &str = "caja";

/// Receivables table carrying member-attributed income
pub const DEFAULT_RECEIVABLES_TABLE: &str = "cxc2024";

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// SQLite database file (opened read-only)
    pub db_path: PathBuf,

    /// Name prefix of the cashbook tables
    pub table_prefix: String,

    /// Table used by the member income report
    pub receivables_table: String,

    /// Initial range for the monthly and top-expense reports
    pub ledger_range: DateRange,

    /// Initial range for the member income report
    pub receivables_range: DateRange,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            receivables_table: DEFAULT_RECEIVABLES_TABLE.to_string(),
            ledger_range: DateRange::new(ymd(2020, 1, 1), ymd(2025, 12, 31)),
            receivables_range: DateRange::new(ymd(2024, 1, 1), ymd(2024, 12, 31)),
        }
    }
}

impl DashboardConfig {
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_receivables_table(mut self, table: impl Into<String>) -> Self {
        self.receivables_table = table.into();
        self
    }
}

// Constant dates only; from_ymd_opt cannot fail for these
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cooperative_books() {
        let config = DashboardConfig::default();

        assert_eq!(config.table_prefix, "caja");
        assert_eq!(config.receivables_table, "cxc2024");
        assert_eq!(config.ledger_range.start.to_string(), "2020-01-01");
        assert_eq!(config.ledger_range.end.to_string(), "2025-12-31");
        assert_eq!(config.receivables_range.start.to_string(), "2024-01-01");
        assert_eq!(config.receivables_range.end.to_string(), "2024-12-31");
    }

    #[test]
    fn test_builder_overrides() {
        let config = DashboardConfig::default()
            .with_db_path("/tmp/books.db")
            .with_table_prefix("fondo")
            .with_receivables_table("cxc2025");

        assert_eq!(config.db_path, PathBuf::from("/tmp/books.db"));
        assert_eq!(config.table_prefix, "fondo");
        assert_eq!(config.receivables_table, "cxc2025");
    }
}
