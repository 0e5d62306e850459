use anyhow::Result;
use cashbook_dashboard::config::{DEFAULT_DB_PATH, DEFAULT_RECEIVABLES_TABLE, DEFAULT_TABLE_PREFIX};
use cashbook_dashboard::{
    conclude, format_amount, inspect_tables, list_parties, run_report, DashboardConfig, DateRange,
    EmptyState, PartyFilter, Report, ReportError, ReportMode, ReportQuery, ReportRows,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Cooperative cashbook dashboard
#[derive(Parser)]
#[command(name = "cashbook-dashboard", version, about, long_about = None)]
struct Cli {
    /// SQLite accounting database (opened read-only)
    #[arg(long, global = true, env = "CASHBOOK_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Name prefix of the cashbook tables
    #[arg(long, global = true, env = "CASHBOOK_TABLE_PREFIX", default_value = DEFAULT_TABLE_PREFIX)]
    table_prefix: String,

    /// Table holding member-attributed income
    #[arg(long, global = true, env = "CASHBOOK_RECEIVABLES_TABLE", default_value = DEFAULT_RECEIVABLES_TABLE)]
    receivables_table: String,

    /// Write logs to this file (the dashboard logs nowhere else)
    #[arg(long, global = true, env = "CASHBOOK_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal dashboard (default)
    Ui,

    /// Run one report and print it
    Report {
        /// Which report to run
        #[arg(value_enum)]
        kind: ReportKind,
        /// First day of the range, YYYY-MM-DD (inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the range, YYYY-MM-DD (inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Member name for the members report ("Todos" for everyone)
        #[arg(long)]
        party: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List discovered cashbook tables and their detected layout
    Tables {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List members found in the receivables table
    Members {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportKind {
    Monthly,
    TopExpenses,
    Members,
}

impl From<ReportKind> for ReportMode {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Monthly => ReportMode::MonthlyTotals,
            ReportKind::TopExpenses => ReportMode::TopExpenses,
            ReportKind::Members => ReportMode::MemberIncome,
        }
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    #[serde(flatten)]
    report: &'a Report,
    conclusion: Option<String>,
    empty_state: Option<EmptyState>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    init_logging(cli.log_file.as_deref(), !interactive)?;

    let config = DashboardConfig::default()
        .with_db_path(&cli.db)
        .with_table_prefix(cli.table_prefix.clone())
        .with_receivables_table(cli.receivables_table.clone());

    match cli.command {
        None | Some(Commands::Ui) => run_ui_mode(config)?,
        Some(Commands::Report { kind, from, to, party, json }) => {
            let mode = ReportMode::from(kind);
            let default = match mode {
                ReportMode::MemberIncome => config.receivables_range,
                _ => config.ledger_range,
            };
            let range = DateRange::new(from.unwrap_or(default.start), to.unwrap_or(default.end));
            let party = party.as_deref().map(PartyFilter::parse).unwrap_or_default();

            run_report_command(&config, ReportQuery::new(mode, range, party), json)?;
        }
        Some(Commands::Tables { json }) => run_tables_command(&config, json)?,
        Some(Commands::Members { json }) => run_members_command(&config, json)?,
    }

    Ok(())
}

/// Logs go to `log_file` when given, otherwise to stderr for one-shot
/// commands. The dashboard never logs to the terminal it draws on.
fn init_logging(log_file: Option<&Path>, to_stderr: bool) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = (to_stderr && file_layer.is_none())
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cashbook_dashboard=info,warn")))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_report_command(config: &DashboardConfig, query: ReportQuery, json: bool) -> Result<()> {
    let report = match run_report(config, &query) {
        Ok(report) => report,
        Err(err) => return report_unavailable(err, json),
    };

    let conclusion = conclude(&report);

    if json {
        let output = ReportOutput {
            report: &report,
            conclusion,
            empty_state: report.empty_state(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("📊 {}", query.mode().title());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let range = query.range();
    println!("Range: {} → {}", range.start, range.end);
    if !report.sources.is_empty() {
        println!("Sources: {}", report.sources.join(", "));
    }
    println!();

    if let Some(state) = report.empty_state() {
        println!("⚠️  {}", state.message());
        return Ok(());
    }

    print!("{}", render_rows(&report.rows));

    if let Some(text) = conclusion {
        println!("\n📝 {}", text.replace("**", ""));
    }

    Ok(())
}

fn run_tables_command(config: &DashboardConfig, json: bool) -> Result<()> {
    let tables = match inspect_tables(config) {
        Ok(tables) => tables,
        Err(err) => return report_unavailable(err, json),
    };

    if json {
        let output: Vec<serde_json::Value> = tables
            .iter()
            .map(|(table, layout)| {
                serde_json::json!({
                    "name": table.name,
                    "columns": table.columns,
                    "layout": layout,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("🗄️  Cashbook tables ({}*)", config.table_prefix);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if tables.is_empty() {
        println!("⚠️  {}", EmptyState::SourceUnavailable.message());
    }
    for (table, layout) in &tables {
        let layout = layout
            .as_ref()
            .map(|l| l.describe())
            .unwrap_or_else(|| "no usable layout".to_string());
        let columns: Vec<&str> = table.columns.iter().map(String::as_str).collect();
        println!("  {:<24} {:<40} [{}]", table.name, layout, columns.join(", "));
    }

    Ok(())
}

fn run_members_command(config: &DashboardConfig, json: bool) -> Result<()> {
    let parties = match list_parties(config) {
        Ok(parties) => parties,
        Err(err) => return report_unavailable(err, json),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&parties)?);
        return Ok(());
    }

    println!("👥 Members ({})", config.receivables_table);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for party in &parties {
        println!("  • {}", party);
    }
    println!("\n✓ {} members", parties.len());

    Ok(())
}

/// Empty states are printed as messages; anything else is a real failure.
fn report_unavailable(err: ReportError, json: bool) -> Result<()> {
    let Some(state) = err.empty_state() else {
        return Err(err.into());
    };

    if json {
        let output = serde_json::json!({
            "empty_state": state,
            "error": err.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        eprintln!("❌ {}", state.message());
        eprintln!("   {}", err);
    }

    Ok(())
}

fn render_rows(rows: &ReportRows) -> String {
    let mut out = String::new();

    match rows {
        ReportRows::MonthlyTotals(rows) => {
            out.push_str(&format!("{:<10} {:>14} {:>14}\n", "Month", "Income", "Expenses"));
            for r in rows {
                out.push_str(&format!(
                    "{:<10} {:>14} {:>14}\n",
                    r.month,
                    format_amount(r.inflow),
                    format_amount(r.outflow)
                ));
            }
        }
        ReportRows::TopExpenses(rows) => {
            out.push_str(&format!("{:<4} {:<32} {:>14}\n", "#", "Concept", "Total"));
            for (i, r) in rows.iter().enumerate() {
                out.push_str(&format!("{:<4} {:<32} {:>14}\n", i + 1, r.detail, format_amount(r.outflow)));
            }
        }
        ReportRows::MemberTotals(rows) => {
            out.push_str(&format!("{:<32} {:>14}\n", "Member", "Income"));
            for r in rows {
                out.push_str(&format!("{:<32} {:>14}\n", r.party, format_amount(r.inflow)));
            }
        }
        ReportRows::MemberTimeline(rows) => {
            out.push_str(&format!("{:<12} {:>14}\n", "Date", "Income"));
            for r in rows {
                out.push_str(&format!("{:<12} {:>14}\n", r.date, format_amount(r.inflow)));
            }
        }
    }

    out
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: DashboardConfig) -> Result<()> {
    use cashbook_dashboard::ui;

    println!("🖥️  Loading Cashbook Dashboard...\n");

    if !config.db_path.exists() {
        eprintln!("⚠️  Database not found at {:?}", config.db_path);
        eprintln!("   Reports will show the data source as unavailable.");
    }

    let mut app = ui::App::new(config);
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: DashboardConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin cashbook-server --features server");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbook_dashboard::{ExpenseTotal, MonthlyTotal};

    #[test]
    fn test_default_command_is_dashboard() {
        let cli = Cli::try_parse_from(["cashbook-dashboard"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.table_prefix, "caja");
    }

    #[test]
    fn test_report_arguments() {
        let cli = Cli::try_parse_from([
            "cashbook-dashboard",
            "report",
            "top-expenses",
            "--from",
            "2024-01-01",
            "--to",
            "2024-06-30",
            "--json",
            "--db",
            "/tmp/books.db",
        ])
        .unwrap();

        assert_eq!(cli.db, PathBuf::from("/tmp/books.db"));
        match cli.command {
            Some(Commands::Report { kind, from, to, json, .. }) => {
                assert_eq!(ReportMode::from(kind), ReportMode::TopExpenses);
                assert_eq!(from.map(|d| d.to_string()).as_deref(), Some("2024-01-01"));
                assert_eq!(to.map(|d| d.to_string()).as_deref(), Some("2024-06-30"));
                assert!(json);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        let result = Cli::try_parse_from(["cashbook-dashboard", "report", "monthly", "--from", "15/01/2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_rows() {
        let text = render_rows(&ReportRows::MonthlyTotals(vec![MonthlyTotal {
            month: "2024-01".to_string(),
            inflow: 1100.0,
            outflow: 70.0,
        }]));
        assert!(text.contains("2024-01"));
        assert!(text.contains("1,100"));

        let text = render_rows(&ReportRows::TopExpenses(vec![ExpenseTotal {
            detail: "Fletes".to_string(),
            outflow: 12.0,
        }]));
        assert!(text.lines().nth(1).unwrap().starts_with("1"));
        assert!(text.contains("Fletes"));
    }
}
