// 📊 Schema-Adaptive Aggregator
// Discovers cashbook tables, normalizes their layouts into one row source
// and runs the three canned reports over an inclusive date range.

use crate::config::DashboardConfig;
use crate::db::{self, quote_identifier, TableDescriptor};
use crate::error::{EmptyState, ReportError, Result};
use crate::schema::{self, columns, ColumnLayout, NormalizationRule};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Maximum number of rows in the top-expenses report
pub const TOP_EXPENSES_LIMIT: usize = 10;

/// Party filter label meaning "every member" (as shown in the selector)
pub const ALL_PARTIES_LABEL: &str = "Todos";

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportMode {
    MonthlyTotals,
    TopExpenses,
    MemberIncome,
}

impl ReportMode {
    pub const ALL: [ReportMode; 3] = [
        ReportMode::MonthlyTotals,
        ReportMode::TopExpenses,
        ReportMode::MemberIncome,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReportMode::MonthlyTotals => "Monthly income & expenses",
            ReportMode::TopExpenses => "Top 10 expenses",
            ReportMode::MemberIncome => "Income by member",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ReportMode::MonthlyTotals => ReportMode::TopExpenses,
            ReportMode::TopExpenses => ReportMode::MemberIncome,
            ReportMode::MemberIncome => ReportMode::MonthlyTotals,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            ReportMode::MonthlyTotals => ReportMode::MemberIncome,
            ReportMode::TopExpenses => ReportMode::MonthlyTotals,
            ReportMode::MemberIncome => ReportMode::TopExpenses,
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportMode::MonthlyTotals => "monthly totals",
            ReportMode::TopExpenses => "top expenses",
            ReportMode::MemberIncome => "member income",
        };
        f.write_str(name)
    }
}

/// Inclusive calendar date range. An inverted range matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn bounds(&self) -> (String, String) {
        (
            self.start.format("%Y-%m-%d").to_string(),
            self.end.format("%Y-%m-%d").to_string(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyFilter {
    #[default]
    All,
    Member(String),
}

impl PartyFilter {
    /// `Todos` and blank select every member. Anything else is a member
    /// name, kept byte for byte so it matches the stored `socio` label.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == ALL_PARTIES_LABEL {
            PartyFilter::All
        } else {
            PartyFilter::Member(value.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PartyFilter::All => ALL_PARTIES_LABEL,
            PartyFilter::Member(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ReportQuery {
    MonthlyTotals { range: DateRange },
    TopExpenses { range: DateRange },
    MemberIncome { range: DateRange, party: PartyFilter },
}

impl ReportQuery {
    pub fn new(mode: ReportMode, range: DateRange, party: PartyFilter) -> Self {
        match mode {
            ReportMode::MonthlyTotals => ReportQuery::MonthlyTotals { range },
            ReportMode::TopExpenses => ReportQuery::TopExpenses { range },
            ReportMode::MemberIncome => ReportQuery::MemberIncome { range, party },
        }
    }

    pub fn mode(&self) -> ReportMode {
        match self {
            ReportQuery::MonthlyTotals { .. } => ReportMode::MonthlyTotals,
            ReportQuery::TopExpenses { .. } => ReportMode::TopExpenses,
            ReportQuery::MemberIncome { .. } => ReportMode::MemberIncome,
        }
    }

    pub fn range(&self) -> DateRange {
        match self {
            ReportQuery::MonthlyTotals { range }
            | ReportQuery::TopExpenses { range }
            | ReportQuery::MemberIncome { range, .. } => *range,
        }
    }
}

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub inflow: f64,
    pub outflow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseTotal {
    pub detail: String,
    pub outflow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyTotal {
    pub party: String,
    pub inflow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyIncome {
    pub date: NaiveDate,
    pub inflow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum ReportRows {
    MonthlyTotals(Vec<MonthlyTotal>),
    TopExpenses(Vec<ExpenseTotal>),
    MemberTotals(Vec<PartyTotal>),
    MemberTimeline(Vec<DailyIncome>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            ReportRows::MonthlyTotals(rows) => rows.len(),
            ReportRows::TopExpenses(rows) => rows.len(),
            ReportRows::MemberTotals(rows) => rows.len(),
            ReportRows::MemberTimeline(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub query: ReportQuery,
    /// Tables that fed the report, in discovery order
    pub sources: Vec<String>,
    pub rows: ReportRows,
}

impl Report {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `Some(NoDataInRange)` when the query matched nothing.
    pub fn empty_state(&self) -> Option<EmptyState> {
        self.is_empty().then_some(EmptyState::NoDataInRange)
    }
}

// ============================================================================
// COMBINED ROW SOURCE
// ============================================================================

/// `UNION ALL` of every qualifying table, in canonical column shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedSource {
    pub sql: String,
    pub tables: Vec<String>,
}

impl CombinedSource {
    /// Concatenate the per-table fragments in discovery order.
    /// Returns `None` when no table qualified.
    pub fn build(rules: &[NormalizationRule]) -> Option<Self> {
        if rules.is_empty() {
            return None;
        }

        let fragments: Vec<String> = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| rule.select_fragment(i))
            .collect();

        Some(Self {
            sql: fragments.join(" UNION ALL "),
            tables: rules.iter().map(|r| r.table.clone()).collect(),
        })
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct Aggregator<'c> {
    conn: &'c Connection,
    table_prefix: String,
    receivables_table: String,
}

impl<'c> Aggregator<'c> {
    pub fn new(conn: &'c Connection, config: &DashboardConfig) -> Self {
        Self {
            conn,
            table_prefix: config.table_prefix.clone(),
            receivables_table: config.receivables_table.clone(),
        }
    }

    pub fn discover_tables(&self) -> Result<Vec<TableDescriptor>> {
        db::discover_tables(self.conn, &self.table_prefix)
    }

    /// Discovered tables with the layout detected for each (if any).
    pub fn inspect_tables(&self) -> Result<Vec<(TableDescriptor, Option<ColumnLayout>)>> {
        Ok(self
            .discover_tables()?
            .into_iter()
            .map(|t| {
                let layout = if t.has_column(columns::DATE) {
                    ColumnLayout::detect(&t)
                } else {
                    None
                };
                (t, layout)
            })
            .collect())
    }

    /// Discover, normalize and union the cashbook tables for `mode`.
    pub fn combined_source(&self, mode: ReportMode) -> Result<CombinedSource> {
        let tables = self.discover_tables()?;
        if tables.is_empty() {
            warn!(prefix = %self.table_prefix, "no cashbook tables found");
            return Err(ReportError::SourceUnavailable {
                pattern: self.table_prefix.clone(),
            });
        }

        let rules: Vec<NormalizationRule> = tables
            .iter()
            .filter_map(|t| {
                let rule = schema::normalize_table(t, mode);
                if rule.is_none() {
                    debug!(table = %t.name, %mode, "table skipped: no usable columns");
                }
                rule
            })
            .collect();

        CombinedSource::build(&rules).ok_or_else(|| {
            warn!(%mode, discovered = tables.len(), "no table has a usable schema");
            ReportError::NoUsableSchema {
                mode,
                discovered: tables.len(),
            }
        })
    }

    /// Run `query` from scratch: discovery, union and aggregation.
    pub fn run(&self, query: &ReportQuery) -> Result<Report> {
        let report = match query {
            ReportQuery::MonthlyTotals { range } => {
                let source = self.combined_source(ReportMode::MonthlyTotals)?;
                let rows = self.monthly_totals(&source, range)?;
                Report {
                    query: query.clone(),
                    sources: source.tables,
                    rows: ReportRows::MonthlyTotals(rows),
                }
            }
            ReportQuery::TopExpenses { range } => {
                let source = self.combined_source(ReportMode::TopExpenses)?;
                let rows = self.top_expenses(&source, range)?;
                Report {
                    query: query.clone(),
                    sources: source.tables,
                    rows: ReportRows::TopExpenses(rows),
                }
            }
            ReportQuery::MemberIncome { range, party } => {
                let table = self.receivables_source()?;
                let rows = match party {
                    PartyFilter::All => ReportRows::MemberTotals(self.member_totals(&table, range)?),
                    PartyFilter::Member(name) => {
                        ReportRows::MemberTimeline(self.member_timeline(&table, range, name)?)
                    }
                };
                Report {
                    query: query.clone(),
                    sources: vec![table],
                    rows,
                }
            }
        };

        info!(mode = %query.mode(), rows = report.len(), "report complete");
        Ok(report)
    }

    /// Sum inflow and outflow per `YYYY-MM`, ascending.
    pub fn monthly_totals(&self, source: &CombinedSource, range: &DateRange) -> Result<Vec<MonthlyTotal>> {
        let sql = format!(
            "SELECT strftime('%Y-%m', entry_date) AS month,
                    SUM(inflow) AS total_inflow,
                    SUM(outflow) AS total_outflow
             FROM ({})
             WHERE date(entry_date) IS NOT NULL
               AND date(entry_date) BETWEEN ?1 AND ?2
             GROUP BY month
             ORDER BY month",
            source.sql
        );

        let (start, end) = range.bounds();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![start, end], |row| {
                Ok(MonthlyTotal {
                    month: row.get(0)?,
                    inflow: row.get(1)?,
                    outflow: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Ten largest details by summed outflow; ties keep first-seen order.
    pub fn top_expenses(&self, source: &CombinedSource, range: &DateRange) -> Result<Vec<ExpenseTotal>> {
        let sql = format!(
            "SELECT CAST(detail AS TEXT) AS detail_label,
                    SUM(outflow) AS total_outflow,
                    MIN(seq) AS first_seen
             FROM (
                 SELECT *, ROW_NUMBER() OVER (ORDER BY source_index, source_row) AS seq
                 FROM ({})
             )
             WHERE date(entry_date) IS NOT NULL
               AND date(entry_date) BETWEEN ?1 AND ?2
               AND detail IS NOT NULL
             GROUP BY detail_label
             ORDER BY total_outflow DESC, first_seen
             LIMIT ?3",
            source.sql
        );

        let (start, end) = range.bounds();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![start, end, TOP_EXPENSES_LIMIT as i64], |row| {
                Ok(ExpenseTotal {
                    detail: row.get(0)?,
                    outflow: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Receivables table name, if it exists and has the member columns.
    pub fn receivables_source(&self) -> Result<String> {
        let table = db::describe_table(self.conn, &self.receivables_table)?.ok_or_else(|| {
            warn!(table = %self.receivables_table, "receivables table not found");
            ReportError::ReceivablesUnavailable {
                table: self.receivables_table.clone(),
            }
        })?;

        if !schema::is_receivables_table(&table) {
            warn!(table = %table.name, "receivables table lacks fecha/socio/entrada");
            return Err(ReportError::NoUsableSchema {
                mode: ReportMode::MemberIncome,
                discovered: 1,
            });
        }

        Ok(table.name)
    }

    /// Summed inflow per member, largest first; ties keep insertion order.
    pub fn member_totals(&self, table: &str, range: &DateRange) -> Result<Vec<PartyTotal>> {
        let sql = format!(
            "SELECT CAST({party} AS TEXT) AS party_label,
                    SUM(COALESCE({inflow}, 0)) AS total_inflow
             FROM {table}
             WHERE date({date}) IS NOT NULL
               AND date({date}) BETWEEN ?1 AND ?2
               AND {party} IS NOT NULL
             GROUP BY party_label
             ORDER BY total_inflow DESC, MIN(rowid)",
            party = quote_identifier(columns::PARTY),
            inflow = quote_identifier(columns::INFLOW),
            date = quote_identifier(columns::DATE),
            table = quote_identifier(table),
        );

        let (start, end) = range.bounds();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![start, end], |row| {
                Ok(PartyTotal {
                    party: row.get(0)?,
                    inflow: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// One member's inflow per day, ascending.
    pub fn member_timeline(&self, table: &str, range: &DateRange, party: &str) -> Result<Vec<DailyIncome>> {
        let sql = format!(
            "SELECT date({date}) AS day,
                    SUM(COALESCE({inflow}, 0)) AS total_inflow
             FROM {table}
             WHERE date({date}) IS NOT NULL
               AND date({date}) BETWEEN ?1 AND ?2
               AND CAST({party} AS TEXT) = ?3
             GROUP BY day
             ORDER BY day",
            party = quote_identifier(columns::PARTY),
            inflow = quote_identifier(columns::INFLOW),
            date = quote_identifier(columns::DATE),
            table = quote_identifier(table),
        );

        let (start, end) = range.bounds();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![start, end, party], |row| {
                let day: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                })?;
                Ok(DailyIncome {
                    date,
                    inflow: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Distinct members of the receivables table, sorted.
    pub fn list_parties(&self) -> Result<Vec<String>> {
        let table = self.receivables_source()?;
        let sql = format!(
            "SELECT DISTINCT CAST({party} AS TEXT) AS party_label
             FROM {table}
             WHERE {party} IS NOT NULL
             ORDER BY party_label",
            party = quote_identifier(columns::PARTY),
            table = quote_identifier(&table),
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let parties = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(parties)
    }
}

// ============================================================================
// SCOPED ENTRY POINTS
// ============================================================================
// Each call opens its own read-only connection and drops it before
// returning, so nothing is held across user interactions.

pub fn run_report(config: &DashboardConfig, query: &ReportQuery) -> Result<Report> {
    let conn = db::open_read_only(&config.db_path)?;
    Aggregator::new(&conn, config).run(query)
}

pub fn list_parties(config: &DashboardConfig) -> Result<Vec<String>> {
    let conn = db::open_read_only(&config.db_path)?;
    Aggregator::new(&conn, config).list_parties()
}

pub fn inspect_tables(config: &DashboardConfig) -> Result<Vec<(TableDescriptor, Option<ColumnLayout>)>> {
    let conn = db::open_read_only(&config.db_path)?;
    Aggregator::new(&conn, config).inspect_tables()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{january_ledger, receivables, LedgerBuilder};
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(date(start), date(end))
    }

    fn run(conn: &Connection, query: ReportQuery) -> Result<Report> {
        Aggregator::new(conn, &DashboardConfig::default()).run(&query)
    }

    fn monthly(report: Report) -> Vec<MonthlyTotal> {
        match report.rows {
            ReportRows::MonthlyTotals(rows) => rows,
            other => panic!("expected monthly totals, got {:?}", other),
        }
    }

    fn expenses(report: Report) -> Vec<ExpenseTotal> {
        match report.rows {
            ReportRows::TopExpenses(rows) => rows,
            other => panic!("expected top expenses, got {:?}", other),
        }
    }

    #[test]
    fn test_two_table_january_scenario() {
        let conn = january_ledger().build();

        let report = run(
            &conn,
            ReportQuery::MonthlyTotals { range: range("2024-01-01", "2024-01-31") },
        )
        .unwrap();

        assert_eq!(report.sources, vec!["caja2024", "caja_prestamos"]);
        assert_eq!(
            monthly(report),
            vec![MonthlyTotal {
                month: "2024-01".to_string(),
                inflow: 110.0,
                outflow: 70.0,
            }]
        );
    }

    #[test]
    fn test_loan_table_mapping() {
        let cols = ["fecha", "prestamo", "abono"];
        let conn = LedgerBuilder::new()
            .table("caja_prestamos", &cols)
            .row("caja_prestamos", &cols, "'2024-03-01', 500, 0")
            .row("caja_prestamos", &cols, "'2024-03-15', 0, 120")
            .row("caja_prestamos", &cols, "'2024-04-02', 200, 80")
            .build();

        let rows = monthly(
            run(
                &conn,
                ReportQuery::MonthlyTotals { range: range("2024-01-01", "2024-12-31") },
            )
            .unwrap(),
        );

        // abono -> inflow, prestamo -> outflow
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, "2024-03");
        assert_eq!(rows[0].inflow, 120.0);
        assert_eq!(rows[0].outflow, 500.0);
        assert_eq!(rows[1].month, "2024-04");
        assert_eq!(rows[1].inflow, 80.0);
        assert_eq!(rows[1].outflow, 200.0);

        let total_in: f64 = rows.iter().map(|r| r.inflow).sum();
        let total_out: f64 = rows.iter().map(|r| r.outflow).sum();
        assert_eq!(total_in, 200.0);
        assert_eq!(total_out, 700.0);
    }

    #[test]
    fn test_monthly_orders_ascending_and_bounds_inclusive() {
        let cols = ["fecha", "entrada", "salida"];
        let conn = LedgerBuilder::new()
            .table("caja1", &cols)
            .row("caja1", &cols, "'2024-03-31', 5, 0")
            .row("caja1", &cols, "'2024-01-01', 1, 0")
            .row("caja1", &cols, "'2024-02-10 14:30:00', 2, 0")
            .row("caja1", &cols, "'2023-12-31', 100, 0")
            .row("caja1", &cols, "'2024-04-01', 100, 0")
            .build();

        let rows = monthly(
            run(
                &conn,
                ReportQuery::MonthlyTotals { range: range("2024-01-01", "2024-03-31") },
            )
            .unwrap(),
        );

        let months: Vec<&str> = rows.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(rows.iter().map(|r| r.inflow).sum::<f64>(), 8.0);
    }

    #[test]
    fn test_null_and_unparsable_dates_excluded() {
        let cols = ["fecha", "detalle", "entrada", "salida"];
        let conn = LedgerBuilder::new()
            .table("caja1", &cols)
            .row("caja1", &cols, "'2024-01-10', 'Insumos', 10, 4")
            .row("caja1", &cols, "NULL, 'Insumos', 1000, 1000")
            .row("caja1", &cols, "'15/01/2024', 'Insumos', 1000, 1000")
            .row("caja1", &cols, "'not a date', 'Fletes', 1000, 1000")
            .build();

        let month_rows = monthly(
            run(
                &conn,
                ReportQuery::MonthlyTotals { range: range("2000-01-01", "2100-12-31") },
            )
            .unwrap(),
        );
        assert_eq!(month_rows.len(), 1);
        assert_eq!(month_rows[0].inflow, 10.0);
        assert_eq!(month_rows[0].outflow, 4.0);

        let top = expenses(
            run(
                &conn,
                ReportQuery::TopExpenses { range: range("2000-01-01", "2100-12-31") },
            )
            .unwrap(),
        );
        assert_eq!(
            top,
            vec![ExpenseTotal { detail: "Insumos".to_string(), outflow: 4.0 }]
        );
    }

    #[test]
    fn test_null_amounts_count_as_zero() {
        let cols = ["fecha", "entrada", "salida"];
        let conn = LedgerBuilder::new()
            .table("caja1", &cols)
            .row("caja1", &cols, "'2024-05-01', NULL, 30")
            .row("caja1", &cols, "'2024-05-02', 20, NULL")
            .build();

        let rows = monthly(
            run(
                &conn,
                ReportQuery::MonthlyTotals { range: range("2024-05-01", "2024-05-31") },
            )
            .unwrap(),
        );

        assert_eq!(rows[0].inflow, 20.0);
        assert_eq!(rows[0].outflow, 30.0);
    }

    #[test]
    fn test_empty_range_returns_empty_report() {
        let conn = january_ledger().build();

        let report = run(
            &conn,
            ReportQuery::MonthlyTotals { range: range("2019-01-01", "2019-12-31") },
        )
        .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.empty_state(), Some(EmptyState::NoDataInRange));

        let report = run(
            &conn,
            ReportQuery::TopExpenses { range: range("2019-01-01", "2019-12-31") },
        )
        .unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_inverted_range_is_empty_not_error() {
        let conn = january_ledger().build();

        let report = run(
            &conn,
            ReportQuery::MonthlyTotals { range: range("2024-12-31", "2024-01-01") },
        )
        .unwrap();

        assert!(report.is_empty());
    }

    #[test]
    fn test_top_expenses_limit_and_order() {
        let cols = ["fecha", "detalle", "salida"];
        let mut builder = LedgerBuilder::new().table("caja_gastos", &cols);
        for i in 1..=12 {
            builder = builder.row(
                "caja_gastos",
                &cols,
                &format!("'2024-02-01', 'Concepto {:02}', {}", i, i * 10),
            );
        }
        let conn = builder.build();

        let rows = expenses(
            run(
                &conn,
                ReportQuery::TopExpenses { range: range("2024-01-01", "2024-12-31") },
            )
            .unwrap(),
        );

        assert_eq!(rows.len(), TOP_EXPENSES_LIMIT);
        assert_eq!(rows[0].detail, "Concepto 12");
        assert_eq!(rows[0].outflow, 120.0);
        assert_eq!(rows[9].detail, "Concepto 03");
        assert!(rows.windows(2).all(|w| w[0].outflow >= w[1].outflow));
    }

    #[test]
    fn test_top_expenses_fewer_than_limit() {
        let conn = january_ledger().build();

        let rows = expenses(
            run(
                &conn,
                ReportQuery::TopExpenses { range: range("2024-01-01", "2024-01-31") },
            )
            .unwrap(),
        );

        // Insumos: salida 40; Prestamo socio: prestamo 30
        assert_eq!(
            rows,
            vec![
                ExpenseTotal { detail: "Insumos".to_string(), outflow: 40.0 },
                ExpenseTotal { detail: "Prestamo socio".to_string(), outflow: 30.0 },
            ]
        );
    }

    #[test]
    fn test_top_expenses_ties_keep_discovery_order() {
        let cols = ["fecha", "detalle", "salida"];
        let conn = LedgerBuilder::new()
            .table("caja_a", &cols)
            .row("caja_a", &cols, "'2024-01-05', 'Zeta', 50")
            .row("caja_a", &cols, "'2024-01-06', 'Alfa', 20")
            .table("caja_b", &cols)
            .row("caja_b", &cols, "'2024-01-01', 'Media', 50")
            .row("caja_b", &cols, "'2024-01-02', 'Alfa', 30")
            .build();

        let rows = expenses(
            run(
                &conn,
                ReportQuery::TopExpenses { range: range("2024-01-01", "2024-01-31") },
            )
            .unwrap(),
        );

        let details: Vec<&str> = rows.iter().map(|r| r.detail.as_str()).collect();
        // All three total 50; Zeta and Alfa first appear in caja_a
        assert_eq!(details, vec!["Zeta", "Alfa", "Media"]);
    }

    #[test]
    fn test_top_expenses_skips_tables_without_detail() {
        let conn = LedgerBuilder::new()
            .table("caja1", &["fecha", "entrada", "salida"])
            .row("caja1", &["fecha", "entrada", "salida"], "'2024-01-05', 0, 999")
            .table("caja_gastos", &["fecha", "detalle", "salida"])
            .row("caja_gastos", &["fecha", "detalle", "salida"], "'2024-01-05', 'Fletes', 12")
            .build();

        let report = run(
            &conn,
            ReportQuery::TopExpenses { range: range("2024-01-01", "2024-01-31") },
        )
        .unwrap();

        assert_eq!(report.sources, vec!["caja_gastos"]);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_no_tables_is_source_unavailable() {
        let conn = receivables(LedgerBuilder::new(), &[("2024-01-01", "A", 5.0)]).build();

        let err = run(
            &conn,
            ReportQuery::MonthlyTotals { range: range("2024-01-01", "2024-12-31") },
        )
        .unwrap_err();

        assert!(matches!(err, ReportError::SourceUnavailable { .. }));
        assert_eq!(err.empty_state(), Some(EmptyState::SourceUnavailable));
        assert_ne!(err.empty_state(), Some(EmptyState::NoDataInRange));
    }

    #[test]
    fn test_no_qualifying_schema() {
        let conn = LedgerBuilder::new()
            .table("caja_notas", &["fecha", "nota"])
            .table("caja_gastos", &["fecha", "detalle", "salida"])
            .build();

        let err = run(
            &conn,
            ReportQuery::MonthlyTotals { range: range("2024-01-01", "2024-12-31") },
        )
        .unwrap_err();

        match err {
            ReportError::NoUsableSchema { mode, discovered } => {
                assert_eq!(mode, ReportMode::MonthlyTotals);
                assert_eq!(discovered, 2);
            }
            other => panic!("expected NoUsableSchema, got {:?}", other),
        }

        // The expense-only table still serves the top-expenses report
        assert!(run(
            &conn,
            ReportQuery::TopExpenses { range: range("2024-01-01", "2024-12-31") },
        )
        .is_ok());
    }

    #[test]
    fn test_member_totals_all() {
        let conn = receivables(
            LedgerBuilder::new(),
            &[("2024-02-01", "A", 50.0), ("2024-03-01", "B", 80.0)],
        )
        .build();

        let report = run(
            &conn,
            ReportQuery::MemberIncome {
                range: range("2024-01-01", "2024-12-31"),
                party: PartyFilter::parse("Todos"),
            },
        )
        .unwrap();

        assert_eq!(report.sources, vec!["cxc2024"]);
        assert_eq!(
            report.rows,
            ReportRows::MemberTotals(vec![
                PartyTotal { party: "B".to_string(), inflow: 80.0 },
                PartyTotal { party: "A".to_string(), inflow: 50.0 },
            ])
        );
    }

    #[test]
    fn test_member_timeline_for_one_party() {
        let conn = receivables(
            LedgerBuilder::new(),
            &[
                ("2024-03-01", "A", 10.0),
                ("2024-01-15", "A", 5.0),
                ("2024-01-15", "A", 7.0),
                ("2024-01-20", "B", 99.0),
                ("2025-01-01", "A", 1000.0),
            ],
        )
        .build();

        let report = run(
            &conn,
            ReportQuery::MemberIncome {
                range: range("2024-01-01", "2024-12-31"),
                party: PartyFilter::parse("A"),
            },
        )
        .unwrap();

        assert_eq!(
            report.rows,
            ReportRows::MemberTimeline(vec![
                DailyIncome { date: date("2024-01-15"), inflow: 12.0 },
                DailyIncome { date: date("2024-03-01"), inflow: 10.0 },
            ])
        );
    }

    #[test]
    fn test_member_income_without_receivables_table() {
        let conn = january_ledger().build();

        let err = run(
            &conn,
            ReportQuery::MemberIncome {
                range: range("2024-01-01", "2024-12-31"),
                party: PartyFilter::All,
            },
        )
        .unwrap_err();

        assert!(matches!(err, ReportError::ReceivablesUnavailable { .. }));
        assert_eq!(err.empty_state(), Some(EmptyState::SourceUnavailable));
    }

    #[test]
    fn test_member_income_with_wrong_columns() {
        let conn = LedgerBuilder::new().table("cxc2024", &["fecha", "socio"]).build();

        let err = run(
            &conn,
            ReportQuery::MemberIncome {
                range: range("2024-01-01", "2024-12-31"),
                party: PartyFilter::All,
            },
        )
        .unwrap_err();

        assert_eq!(err.empty_state(), Some(EmptyState::NoUsableSchema));
    }

    #[test]
    fn test_list_parties() {
        let conn = receivables(
            LedgerBuilder::new(),
            &[("2024-01-01", "Rosa", 1.0), ("2024-01-02", "Ana", 1.0), ("2024-01-03", "Rosa", 1.0)],
        )
        .build();

        let parties = Aggregator::new(&conn, &DashboardConfig::default())
            .list_parties()
            .unwrap();
        assert_eq!(parties, vec!["Ana", "Rosa"]);
    }

    #[test]
    fn test_inspect_tables() {
        let conn = january_ledger().table("caja_notas", &["fecha", "nota"]).build();

        let tables = Aggregator::new(&conn, &DashboardConfig::default())
            .inspect_tables()
            .unwrap();

        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].1, Some(ColumnLayout::CashFlow));
        assert_eq!(tables[1].1, Some(ColumnLayout::Loan));
        assert_eq!(tables[2].1, None);
    }

    #[test]
    fn test_run_report_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contabilidad.db");
        january_ledger().build_at(&path);

        let config = DashboardConfig::default().with_db_path(&path);
        let report = run_report(
            &config,
            &ReportQuery::MonthlyTotals { range: range("2024-01-01", "2024-01-31") },
        )
        .unwrap();

        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_run_report_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::default().with_db_path(dir.path().join("nope.db"));

        let err = run_report(
            &config,
            &ReportQuery::MonthlyTotals { range: range("2024-01-01", "2024-01-31") },
        )
        .unwrap_err();

        assert_eq!(err.empty_state(), Some(EmptyState::SourceUnavailable));
    }

    #[test]
    fn test_party_filter_parse() {
        assert_eq!(PartyFilter::parse("Todos"), PartyFilter::All);
        assert_eq!(PartyFilter::parse(" Todos "), PartyFilter::All);
        assert_eq!(PartyFilter::parse("  "), PartyFilter::All);
        assert_eq!(PartyFilter::parse("Rosa"), PartyFilter::Member("Rosa".to_string()));
    }

    #[test]
    fn test_party_names_are_kept_verbatim() {
        assert_eq!(PartyFilter::parse("Ana "), PartyFilter::Member("Ana ".to_string()));
        // Only "Todos" is reserved; a member called "all" is still a member
        assert_eq!(PartyFilter::parse("all"), PartyFilter::Member("all".to_string()));
        assert_eq!(PartyFilter::parse("ALL"), PartyFilter::Member("ALL".to_string()));
    }

    #[test]
    fn test_listed_party_round_trips_into_timeline() {
        let conn = receivables(
            LedgerBuilder::new(),
            &[("2024-02-01", "Ana ", 50.0), ("2024-03-01", "all", 20.0)],
        )
        .build();
        let aggregator = Aggregator::new(&conn, &DashboardConfig::default());

        let parties = aggregator.list_parties().unwrap();
        assert_eq!(parties, vec!["Ana ", "all"]);

        for party in &parties {
            let report = aggregator
                .run(&ReportQuery::MemberIncome {
                    range: range("2024-01-01", "2024-12-31"),
                    party: PartyFilter::parse(party),
                })
                .unwrap();
            match report.rows {
                ReportRows::MemberTimeline(rows) => assert_eq!(rows.len(), 1, "timeline for {:?}", party),
                other => panic!("expected a member timeline, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_integer_member_ids_match_their_label() {
        let cols = ["fecha", "socio", "entrada"];
        let conn = LedgerBuilder::new()
            .table("cxc2024", &cols)
            .row("cxc2024", &cols, "'2024-02-01', 101, 50")
            .row("cxc2024", &cols, "'2024-03-01', '101', 30")
            .build();
        let aggregator = Aggregator::new(&conn, &DashboardConfig::default());

        assert_eq!(aggregator.list_parties().unwrap(), vec!["101"]);

        let report = aggregator
            .run(&ReportQuery::MemberIncome {
                range: range("2024-01-01", "2024-12-31"),
                party: PartyFilter::parse("101"),
            })
            .unwrap();
        assert_eq!(
            report.rows,
            ReportRows::MemberTimeline(vec![
                DailyIncome { date: date("2024-02-01"), inflow: 50.0 },
                DailyIncome { date: date("2024-03-01"), inflow: 30.0 },
            ])
        );

        let report = aggregator
            .run(&ReportQuery::MemberIncome {
                range: range("2024-01-01", "2024-12-31"),
                party: PartyFilter::All,
            })
            .unwrap();
        assert_eq!(
            report.rows,
            ReportRows::MemberTotals(vec![PartyTotal { party: "101".to_string(), inflow: 80.0 }])
        );
    }

    #[test]
    fn test_top_expenses_group_mixed_storage_types() {
        let cols = ["fecha", "detalle", "salida"];
        let conn = LedgerBuilder::new()
            .table("caja_gastos", &cols)
            .row("caja_gastos", &cols, "'2024-01-05', 1, 50")
            .row("caja_gastos", &cols, "'2024-01-06', '1', 30")
            .row("caja_gastos", &cols, "'2024-01-07', 'Fletes', 10")
            .build();

        let rows = expenses(
            run(
                &conn,
                ReportQuery::TopExpenses { range: range("2024-01-01", "2024-01-31") },
            )
            .unwrap(),
        );

        assert_eq!(
            rows,
            vec![
                ExpenseTotal { detail: "1".to_string(), outflow: 80.0 },
                ExpenseTotal { detail: "Fletes".to_string(), outflow: 10.0 },
            ]
        );
    }

    #[test]
    fn test_mode_cycle() {
        for mode in ReportMode::ALL {
            assert_eq!(mode.next().previous(), mode);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        // Summing monthly inflow must give back every in-range row's inflow.
        #[test]
        fn prop_monthly_inflow_is_conserved(
            cash in prop::collection::vec((0u32..400, 0i64..10_000, 0i64..10_000), 0..25),
            loans in prop::collection::vec((0u32..400, 0i64..10_000, 0i64..10_000), 0..25),
            start_offset in 0u32..200,
            span in 0u32..300,
        ) {
            let base = date("2024-01-01");
            let day = |offset: u32| base + chrono::Duration::days(offset as i64);

            let cash_cols = ["fecha", "entrada", "salida"];
            let loan_cols = ["fecha", "prestamo", "abono"];
            let mut builder = LedgerBuilder::new()
                .table("caja_general", &cash_cols)
                .table("caja_prestamos", &loan_cols);
            for (offset, inflow, outflow) in &cash {
                builder = builder.row(
                    "caja_general",
                    &cash_cols,
                    &format!("'{}', {}, {}", day(*offset), inflow, outflow),
                );
            }
            for (offset, issued, repaid) in &loans {
                builder = builder.row(
                    "caja_prestamos",
                    &loan_cols,
                    &format!("'{}', {}, {}", day(*offset), issued, repaid),
                );
            }
            let conn = builder.build();

            let window = DateRange::new(day(start_offset), day(start_offset + span));
            let expected: i64 = cash
                .iter()
                .filter(|(o, _, _)| window.contains(day(*o)))
                .map(|(_, inflow, _)| *inflow)
                .chain(
                    loans
                        .iter()
                        .filter(|(o, _, _)| window.contains(day(*o)))
                        .map(|(_, _, repaid)| *repaid),
                )
                .sum();

            let rows = monthly(run(&conn, ReportQuery::MonthlyTotals { range: window }).unwrap());
            let total: f64 = rows.iter().map(|r| r.inflow).sum();

            prop_assert_eq!(total, expected as f64);
            prop_assert!(rows.windows(2).all(|w| w[0].month < w[1].month));
        }
    }
}
