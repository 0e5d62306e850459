use crate::error::{ReportError, Result};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// A source table found in the catalog, with its declared columns.
///
/// Column names are lowercased; SQLite identifiers are case-insensitive so
/// the lowercased form can be used verbatim in generated SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: BTreeSet<String>,
}

impl TableDescriptor {
    pub fn new<I, S>(name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.to_string(),
            columns: columns
                .into_iter()
                .map(|c| c.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn has_columns(&self, columns: &[&str]) -> bool {
        columns.iter().all(|c| self.has_column(c))
    }
}

/// Open the accounting database read-only.
///
/// The connection is meant to live for a single report: callers open it,
/// run discovery and aggregation, and drop it before rendering.
pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(ReportError::DatabaseNotFound(db_path.to_path_buf()));
    }

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    debug!(path = %db_path.display(), "opened database read-only");
    Ok(conn)
}

/// List every table whose name starts with `prefix`, in catalog order.
///
/// Matching follows SQLite `LIKE` (ASCII case-insensitive); `%` and `_` in
/// the prefix are taken literally.
pub fn discover_tables(conn: &Connection, prefix: &str) -> Result<Vec<TableDescriptor>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name LIKE ?1 ESCAPE '\\'
         ORDER BY rowid",
    )?;

    let pattern = format!("{}%", escape_like(prefix));
    let names = stmt
        .query_map([pattern], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = table_columns(conn, &name)?;
        tables.push(TableDescriptor { name, columns });
    }

    debug!(prefix, count = tables.len(), "discovered tables");
    Ok(tables)
}

/// Describe a single table by exact name, or `None` if it does not exist.
pub fn describe_table(conn: &Connection, name: &str) -> Result<Option<TableDescriptor>> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(None);
    }

    Ok(Some(TableDescriptor {
        name: name.to_string(),
        columns: table_columns(conn, name)?,
    }))
}

/// Declared column names of `table`, lowercased.
pub fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;

    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .map(|name| name.map(|n| n.to_lowercase()))
        .collect::<std::result::Result<BTreeSet<_>, _>>()?;

    Ok(columns)
}

/// Quote an identifier for interpolation into generated SQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
