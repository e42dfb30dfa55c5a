//! SQLite access: connections, live datasets and setup operations

mod operation;
pub mod value;

use std::time::Duration;

use rusqlite::Connection;

use crate::config::{Driver, FixtureConfig};
use crate::error::{FixtureError, Result};
use crate::model::{CellType, CellValue, Column, Dataset, Table};

pub use operation::DatabaseOperation;

/// Opens connections to the configured database.
///
/// Every connection is independent, so a plain `:memory:` URL gives each
/// one its own empty database; use a file path or a shared-cache `file:`
/// URI to see the same data from several connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    driver: Driver,
    url: String,
    busy_timeout: Duration,
}

impl DataSource {
    /// Create a data source from connection settings
    pub fn new(config: &FixtureConfig) -> Self {
        Self {
            driver: config.driver,
            url: config.url.clone(),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }

    /// Open a new connection
    pub fn connection(&self) -> Result<Connection> {
        let conn = match self.driver {
            Driver::Sqlite => Connection::open(&self.url)?,
        };
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Quote an SQL identifier
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column metadata of a live table, in table order; primary key columns
/// are flagged. Fails with [`FixtureError::NoSuchTable`] for unknown tables.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<Column>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let decl: Option<String> = row.get(2)?;
            let pk: i64 = row.get(5)?;
            Ok((name, decl, pk))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if rows.is_empty() {
        return Err(FixtureError::NoSuchTable(table.to_string()));
    }

    let columns = rows
        .into_iter()
        .enumerate()
        .map(|(index, (name, decl, pk))| {
            let mut column =
                Column::with_type(name, index, CellType::from_declared(decl.as_deref().unwrap_or("")));
            column.primary_key = pk > 0;
            column
        })
        .collect();
    Ok(columns)
}

/// Primary key column names of a live table, in key order
pub fn primary_key(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let mut keys = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(5)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    keys.retain(|(pk, _)| *pk > 0);
    keys.sort();
    Ok(keys.into_iter().map(|(_, name)| name).collect())
}

/// Names of all user tables, sorted
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Read a live table, rows ordered by primary key (rowid without one)
pub fn read_table(conn: &Connection, name: &str) -> Result<Table> {
    let columns = table_columns(conn, name)?;
    let keys = primary_key(conn, name)?;

    let select = columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let order = if keys.is_empty() {
        "rowid".to_string()
    } else {
        keys.iter().map(|k| quote_ident(k)).collect::<Vec<_>>().join(", ")
    };
    let sql = format!("SELECT {select} FROM {} ORDER BY {order}", quote_ident(name));

    let types: Vec<CellType> = columns.iter().map(|c| c.cell_type).collect();
    let mut table = Table::new(name, columns);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut line = 0;
    while let Some(row) = rows.next()? {
        line += 1;
        let cells = types
            .iter()
            .enumerate()
            .map(|(i, ty)| Ok(value::from_sql(row.get_ref(i)?, *ty)))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        table.add_row(cells, line);
    }

    tracing::debug!(table = name, rows = table.row_count(), "read live table");
    Ok(table)
}

/// Read live tables into a dataset, in the given order
pub fn read_dataset<S: AsRef<str>>(conn: &Connection, names: &[S]) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    for name in names {
        dataset.add_table(read_table(conn, name.as_ref())?)?;
    }
    Ok(dataset)
}

/// Type a fixture table's text cells by the live table's declared column
/// types. Columns the live table lacks are left as they are.
pub fn conform_table(conn: &Connection, table: &Table) -> Result<Table> {
    let live = table_columns(conn, &table.name)?;
    let types: Vec<Option<CellType>> = table
        .columns
        .iter()
        .map(|c| live.iter().find(|l| l.is_named(&c.name)).map(|l| l.cell_type))
        .collect();

    let mut columns = table.columns.clone();
    for (column, cell_type) in columns.iter_mut().zip(&types) {
        if let Some(cell_type) = cell_type {
            column.cell_type = *cell_type;
        }
    }

    let mut result = Table::new(table.name.clone(), columns);
    for row in &table.rows {
        let cells = row
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match (cell, types.get(i).copied().flatten()) {
                (CellValue::String(text), Some(cell_type)) => value::from_text(text, cell_type),
                _ => cell.clone(),
            })
            .collect();
        result.add_row(cells, row.source_line);
    }
    Ok(result)
}

/// Type every table of a fixture dataset against the live schema
pub fn conform_dataset(conn: &Connection, dataset: &Dataset) -> Result<Dataset> {
    let conformed = dataset.map_tables(|t| conform_table(conn, t))?;
    tracing::debug!(tables = conformed.table_count(), "typed dataset by live schema");
    Ok(conformed)
}
