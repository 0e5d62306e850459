// 🚧 Error & empty-state types for the report pipeline

use crate::report::ReportMode;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("database not found at {0}")]
    DatabaseNotFound(PathBuf),

    #[error("no tables named '{pattern}*' found in the database")]
    SourceUnavailable { pattern: String },

    #[error("receivables table '{table}' not found in the database")]
    ReceivablesUnavailable { table: String },

    #[error("none of the {discovered} discovered table(s) has usable columns for {mode}")]
    NoUsableSchema { mode: ReportMode, discovered: usize },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// The three user-visible "nothing to show" conditions.
///
/// Each maps to its own message in every presentation shell; they must
/// never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// No source tables (or no database at all)
    SourceUnavailable,
    /// Tables exist but none has a recognizable column layout
    NoUsableSchema,
    /// Query ran fine and matched zero rows
    NoDataInRange,
}

impl EmptyState {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyState::SourceUnavailable => {
                "Data source unavailable: no cashbook tables were found in the database."
            }
            EmptyState::NoUsableSchema => {
                "No usable schema: none of the tables has valid columns for this report."
            }
            EmptyState::NoDataInRange => "No data found for the selected range.",
        }
    }
}

impl ReportError {
    /// Empty-state condition for this error, or `None` for genuine faults
    /// (SQL errors) that the caller should log.
    pub fn empty_state(&self) -> Option<EmptyState> {
        match self {
            ReportError::DatabaseNotFound(_)
            | ReportError::SourceUnavailable { .. }
            | ReportError::ReceivablesUnavailable { .. } => Some(EmptyState::SourceUnavailable),
            ReportError::NoUsableSchema { .. } => Some(EmptyState::NoUsableSchema),
            ReportError::Database(_) => None,
        }
    }
}
