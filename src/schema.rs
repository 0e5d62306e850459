// 📐 Shape Layer - Column layout detection
// Maps each cashbook table's declared columns onto the canonical
// (entry_date, inflow, outflow, detail) row shape.

use crate::db::{quote_identifier, TableDescriptor};
use crate::report::ReportMode;
use serde::Serialize;

// ============================================================================
// SOURCE VOCABULARY
// ============================================================================

/// Column names used by the cooperative's books.
pub mod columns {
    pub const DATE: &str = "fecha";
    pub const INFLOW: &str = "entrada";
    pub const OUTFLOW: &str = "salida";
    /// Loan disbursement: cash leaving the fund
    pub const LOAN_ISSUED: &str = "prestamo";
    /// Loan repayment: cash coming back into the fund
    pub const LOAN_REPAID: &str = "abono";
    pub const DETAIL: &str = "detalle";
    pub const PARTY: &str = "socio";
}

// ============================================================================
// LAYOUTS
// ============================================================================

/// How a table records money, decided from its declared columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnLayout {
    /// `entrada` / `salida`
    CashFlow,
    /// `prestamo` / `abono`: repayments are inflow, disbursements outflow
    Loan,
    /// Only an outflow-like column; inflow is zero
    ExpenseOnly { outflow: String },
}

impl ColumnLayout {
    /// Classify a table. Precedence: cash-flow pair, loan pair, then a lone
    /// outflow column. `None` means the table is not a ledger we understand.
    pub fn detect(table: &TableDescriptor) -> Option<Self> {
        use columns::*;

        if table.has_columns(&[INFLOW, OUTFLOW]) {
            Some(ColumnLayout::CashFlow)
        } else if table.has_columns(&[LOAN_ISSUED, LOAN_REPAID]) {
            Some(ColumnLayout::Loan)
        } else if table.has_column(OUTFLOW) {
            Some(ColumnLayout::ExpenseOnly { outflow: OUTFLOW.to_string() })
        } else if table.has_column(LOAN_ISSUED) {
            Some(ColumnLayout::ExpenseOnly { outflow: LOAN_ISSUED.to_string() })
        } else {
            None
        }
    }

    fn inflow_column(&self) -> Option<&str> {
        match self {
            ColumnLayout::CashFlow => Some(columns::INFLOW),
            ColumnLayout::Loan => Some(columns::LOAN_REPAID),
            ColumnLayout::ExpenseOnly { .. } => None,
        }
    }

    fn outflow_column(&self) -> &str {
        match self {
            ColumnLayout::CashFlow => columns::OUTFLOW,
            ColumnLayout::Loan => columns::LOAN_ISSUED,
            ColumnLayout::ExpenseOnly { outflow } => outflow.as_str(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ColumnLayout::CashFlow => "cash flow (entrada/salida)".to_string(),
            ColumnLayout::Loan => "loan (abono→inflow, prestamo→outflow)".to_string(),
            ColumnLayout::ExpenseOnly { outflow } => format!("expense only ({})", outflow),
        }
    }
}

// ============================================================================
// NORMALIZATION RULE
// ============================================================================

/// One table's contribution to the combined row source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationRule {
    pub table: String,
    pub layout: ColumnLayout,
    pub has_detail: bool,
}

impl NormalizationRule {
    /// SELECT fragment producing canonical columns:
    /// `entry_date, inflow, outflow, detail, source_index, source_row`.
    ///
    /// `source_index` is the table's discovery position and `source_row` its
    /// rowid; together they give the insertion order used to break ties.
    pub fn select_fragment(&self, source_index: usize) -> String {
        let inflow = match self.layout.inflow_column() {
            Some(col) => format!("COALESCE({}, 0)", quote_identifier(col)),
            None => "0".to_string(),
        };
        let outflow = format!("COALESCE({}, 0)", quote_identifier(self.layout.outflow_column()));
        let detail = if self.has_detail {
            quote_identifier(columns::DETAIL)
        } else {
            "NULL".to_string()
        };

        format!(
            "SELECT {date} AS entry_date, {inflow} AS inflow, {outflow} AS outflow, \
             {detail} AS detail, {source_index} AS source_index, rowid AS source_row \
             FROM {table}",
            date = quote_identifier(columns::DATE),
            table = quote_identifier(&self.table),
        )
    }
}

/// Decide whether `table` can feed a report in `mode`, and how.
pub fn normalize_table(table: &TableDescriptor, mode: ReportMode) -> Option<NormalizationRule> {
    if !table.has_column(columns::DATE) {
        return None;
    }

    let layout = ColumnLayout::detect(table)?;
    let has_detail = table.has_column(columns::DETAIL);

    let qualifies = match mode {
        ReportMode::MonthlyTotals => {
            matches!(layout, ColumnLayout::CashFlow | ColumnLayout::Loan)
        }
        ReportMode::TopExpenses => has_detail,
        // Member income reads the receivables table directly
        ReportMode::MemberIncome => false,
    };

    qualifies.then(|| NormalizationRule {
        table: table.name.clone(),
        layout,
        has_detail,
    })
}

/// Columns the receivables table must declare for the member report.
pub fn is_receivables_table(table: &TableDescriptor) -> bool {
    table.has_columns(&[columns::DATE, columns::PARTY, columns::INFLOW])
}
