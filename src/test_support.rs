// Synthetic accounting databases for tests

use rusqlite::Connection;
use std::path::Path;

use crate::db::quote_identifier;

#[derive(Default)]
pub struct LedgerBuilder {
    statements: Vec<String>,
}

impl LedgerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Untyped columns, so SQLite keeps whatever is inserted (text dates,
    /// integers, reals, NULL, garbage).
    pub fn table(mut self, name: &str, columns: &[&str]) -> Self {
        let cols: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
        self.statements.push(format!(
            "CREATE TABLE {} ({})",
            quote_identifier(name),
            cols.join(", ")
        ));
        self
    }

    /// Insert one row; `values` is a raw SQL tuple body, e.g. `"'2024-01-15', 100, 40"`.
    pub fn row(mut self, table: &str, columns: &[&str], values: &str) -> Self {
        let cols: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
        self.statements.push(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            cols.join(", "),
            values
        ));
        self
    }

    pub fn build(self) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        self.apply(&conn);
        conn
    }

    pub fn build_at(self, path: &Path) {
        let conn = Connection::open(path).unwrap();
        self.apply(&conn);
    }

    fn apply(&self, conn: &Connection) {
        for stmt in &self.statements {
            conn.execute(stmt, []).unwrap();
        }
    }
}

/// The two-table January scenario: a cash-flow table and a loan table.
pub fn january_ledger() -> LedgerBuilder {
    LedgerBuilder::new()
        .table("caja2024", &["fecha", "detalle", "entrada", "salida"])
        .row("caja2024", &["fecha", "detalle", "entrada", "salida"], "'2024-01-15', 'Insumos', 100, 40")
        .table("caja_prestamos", &["fecha", "detalle", "prestamo", "abono"])
        .row("caja_prestamos", &["fecha", "detalle", "prestamo", "abono"], "'2024-01-20', 'Prestamo socio', 30, 10")
}

/// Receivables table with member-attributed income.
pub fn receivables(builder: LedgerBuilder, rows: &[(&str, &str, f64)]) -> LedgerBuilder {
    let cols = ["fecha", "socio", "entrada"];
    let mut builder = builder.table("cxc2024", &cols);
    for (date, party, inflow) in rows {
        builder = builder.row("cxc2024", &cols, &format!("'{}', '{}', {}", date, party, inflow));
    }
    builder
}
