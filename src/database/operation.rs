//! Setup operations applying a dataset to the database

use rusqlite::{params_from_iter, Connection};

use super::value::to_sql;
use super::{primary_key, quote_ident};
use crate::error::{FixtureError, Result};
use crate::model::{Dataset, Row, Table};

/// How a fixture dataset is applied to the database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DatabaseOperation {
    /// Leave the database untouched
    None,
    /// Update existing rows by primary key
    Update,
    /// Insert every row
    Insert,
    /// Update rows by primary key, inserting the ones not found
    Refresh,
    /// Delete the dataset's rows by primary key
    Delete,
    /// Delete every row of the dataset's tables
    DeleteAll,
    /// Delete every row and reset AUTOINCREMENT counters
    Truncate,
    /// Delete every row of the dataset's tables, then insert
    #[default]
    CleanInsert,
}

impl std::str::FromStr for DatabaseOperation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "none" => Ok(DatabaseOperation::None),
            "update" => Ok(DatabaseOperation::Update),
            "insert" => Ok(DatabaseOperation::Insert),
            "refresh" => Ok(DatabaseOperation::Refresh),
            "delete" => Ok(DatabaseOperation::Delete),
            "delete-all" => Ok(DatabaseOperation::DeleteAll),
            "truncate" | "truncate-table" => Ok(DatabaseOperation::Truncate),
            "clean-insert" => Ok(DatabaseOperation::CleanInsert),
            _ => Err(format!("Unknown database operation: {}", s)),
        }
    }
}

impl std::fmt::Display for DatabaseOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DatabaseOperation::None => "none",
            DatabaseOperation::Update => "update",
            DatabaseOperation::Insert => "insert",
            DatabaseOperation::Refresh => "refresh",
            DatabaseOperation::Delete => "delete",
            DatabaseOperation::DeleteAll => "delete-all",
            DatabaseOperation::Truncate => "truncate",
            DatabaseOperation::CleanInsert => "clean-insert",
        };
        write!(f, "{}", name)
    }
}

impl DatabaseOperation {
    /// Apply a dataset in a single transaction.
    ///
    /// Inserts and updates visit tables in dataset order, deletes in
    /// reverse order so child tables are emptied before their parents.
    pub fn execute(self, conn: &mut Connection, dataset: &Dataset) -> Result<()> {
        if self == DatabaseOperation::None {
            return Ok(());
        }

        let tx = conn.transaction()?;
        match self {
            DatabaseOperation::None => {}
            DatabaseOperation::Update => {
                for table in dataset.tables() {
                    update_table(&tx, table, false)?;
                }
            }
            DatabaseOperation::Insert => {
                for table in dataset.tables() {
                    insert_table(&tx, table)?;
                }
            }
            DatabaseOperation::Refresh => {
                for table in dataset.tables() {
                    update_table(&tx, table, true)?;
                }
            }
            DatabaseOperation::Delete => {
                for table in dataset.tables().rev() {
                    delete_rows(&tx, table)?;
                }
            }
            DatabaseOperation::DeleteAll => {
                for table in dataset.tables().rev() {
                    delete_all(&tx, &table.name)?;
                }
            }
            DatabaseOperation::Truncate => {
                for table in dataset.tables().rev() {
                    delete_all(&tx, &table.name)?;
                    reset_sequence(&tx, &table.name)?;
                }
            }
            DatabaseOperation::CleanInsert => {
                for table in dataset.tables().rev() {
                    delete_all(&tx, &table.name)?;
                }
                for table in dataset.tables() {
                    insert_table(&tx, table)?;
                }
            }
        }
        tx.commit()?;

        tracing::debug!(operation = %self, tables = dataset.table_count(), "applied dataset");
        Ok(())
    }
}

fn insert_table(conn: &Connection, table: &Table) -> Result<()> {
    table.check_arity()?;
    if table.column_count() == 0 {
        return Ok(());
    }

    let columns: Vec<String> = table.column_names().map(quote_ident).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&table.name),
        columns.join(", "),
        placeholders
    );

    let mut stmt = conn.prepare(&sql)?;
    for row in &table.rows {
        stmt.execute(params_from_iter(row.cells.iter().map(to_sql)))?;
    }

    tracing::debug!(table = %table.name, rows = table.row_count(), "inserted rows");
    Ok(())
}

fn delete_all(conn: &Connection, table: &str) -> Result<()> {
    let deleted = conn.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?;
    tracing::debug!(table, deleted, "deleted all rows");
    Ok(())
}

fn reset_sequence(conn: &Connection, table: &str) -> Result<()> {
    let has_sequence: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence')",
        [],
        |row| row.get(0),
    )?;
    if has_sequence {
        conn.execute("DELETE FROM sqlite_sequence WHERE name = ?1 COLLATE NOCASE", [table])?;
    }
    Ok(())
}

/// Positions of the live table's primary key columns within the dataset table
fn key_indices(conn: &Connection, table: &Table) -> Result<Vec<usize>> {
    let keys = primary_key(conn, &table.name)?;
    if keys.is_empty() {
        return Err(FixtureError::NoPrimaryKey(table.name.clone()));
    }
    keys.iter()
        .map(|key| {
            table
                .column_index(key)
                .ok_or_else(|| FixtureError::NoPrimaryKey(table.name.clone()))
        })
        .collect()
}

fn where_clause(table: &Table, keys: &[usize]) -> String {
    keys.iter()
        .map(|&i| format!("{} = ?", quote_ident(&table.columns[i].name)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn key_values(row: &Row, keys: &[usize]) -> Vec<rusqlite::types::Value> {
    keys.iter().map(|&i| to_sql(&row.cells[i])).collect()
}

/// Update rows by primary key; a row matching nothing is inserted when
/// `insert_missing` is set and an error otherwise
fn update_table(conn: &Connection, table: &Table, insert_missing: bool) -> Result<()> {
    table.check_arity()?;
    let keys = key_indices(conn, table)?;
    let values: Vec<usize> = (0..table.column_count())
        .filter(|i| !keys.contains(i))
        .collect();
    let filter = where_clause(table, &keys);

    // A table made only of key columns has nothing to update; count matches instead
    let sql = if values.is_empty() {
        format!("SELECT COUNT(*) FROM {} WHERE {filter}", quote_ident(&table.name))
    } else {
        let assignments = values
            .iter()
            .map(|&i| format!("{} = ?", quote_ident(&table.columns[i].name)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE {} SET {assignments} WHERE {filter}", quote_ident(&table.name))
    };

    let mut stmt = conn.prepare(&sql)?;
    let mut missing = Vec::new();
    for row in &table.rows {
        let mut params: Vec<_> = values.iter().map(|&i| to_sql(&row.cells[i])).collect();
        params.extend(key_values(row, &keys));

        let matched = if values.is_empty() {
            stmt.query_row(params_from_iter(params), |r| r.get::<_, i64>(0))? > 0
        } else {
            stmt.execute(params_from_iter(params))? > 0
        };

        if !matched {
            if !insert_missing {
                return Err(FixtureError::RowNotFound {
                    table: table.name.clone(),
                    row: row.source_line,
                });
            }
            missing.push(row.clone());
        }
    }

    if !missing.is_empty() {
        let mut inserts = Table::new(table.name.clone(), table.columns.clone());
        inserts.rows = missing;
        insert_table(conn, &inserts)?;
    }

    tracing::debug!(table = %table.name, rows = table.row_count(), insert_missing, "updated rows");
    Ok(())
}

fn delete_rows(conn: &Connection, table: &Table) -> Result<()> {
    table.check_arity()?;
    let keys = key_indices(conn, table)?;
    let sql = format!(
        "DELETE FROM {} WHERE {}",
        quote_ident(&table.name),
        where_clause(table, &keys)
    );

    let mut stmt = conn.prepare(&sql)?;
    for row in &table.rows {
        stmt.execute(params_from_iter(key_values(row, &keys)))?;
    }

    tracing::debug!(table = %table.name, rows = table.row_count(), "deleted rows");
    Ok(())
}
