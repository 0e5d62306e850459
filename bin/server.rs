// Cashbook Dashboard - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use cashbook_dashboard::config::{DEFAULT_DB_PATH, DEFAULT_RECEIVABLES_TABLE, DEFAULT_TABLE_PREFIX};
use cashbook_dashboard::{api, DashboardConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Cashbook dashboard - JSON API server
#[derive(Parser)]
#[command(name = "cashbook-server", version, about, long_about = None)]
struct Args {
    /// SQLite accounting database (opened read-only)
    #[arg(long, env = "CASHBOOK_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Name prefix of the cashbook tables
    #[arg(long, env = "CASHBOOK_TABLE_PREFIX", default_value = DEFAULT_TABLE_PREFIX)]
    table_prefix: String,

    /// Table holding member-attributed income
    #[arg(long, env = "CASHBOOK_RECEIVABLES_TABLE", default_value = DEFAULT_RECEIVABLES_TABLE)]
    receivables_table: String,

    /// Address to listen on
    #[arg(long, env = "CASHBOOK_ADDR", default_value = "0.0.0.0:3000")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cashbook_dashboard=debug,tower_http=debug,info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    println!("🌐 Cashbook Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Reports open the database per request; a missing file is reported as 404
    if !args.db.exists() {
        warn!(path = %args.db.display(), "database not found; reports will be unavailable");
    }

    let config = DashboardConfig::default()
        .with_db_path(&args.db)
        .with_table_prefix(args.table_prefix)
        .with_receivables_table(args.receivables_table);

    let app = api::router(config);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("failed to bind to {}", args.addr))?;

    info!(addr = %args.addr, db = %args.db.display(), "server listening");
    println!("\n🚀 Server running on http://{}", args.addr);
    println!("   API: http://{}/api/reports/monthly", args.addr);
    println!("   UI:  http://{}", args.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("server failed")?;

    Ok(())
}
