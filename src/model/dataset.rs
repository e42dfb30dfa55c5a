//! Named collection of tables

use indexmap::IndexMap;

use super::table::Table;
use crate::error::{FixtureError, Result};

/// An ordered set of uniquely named tables: a fixture or a database snapshot.
///
/// Table names are matched ASCII case-insensitively, the way SQLite
/// resolves identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    tables: IndexMap<String, Table>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from tables, rejecting duplicate names
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Result<Self> {
        let mut dataset = Self::new();
        for table in tables {
            dataset.add_table(table)?;
        }
        Ok(dataset)
    }

    /// Append a table
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        let key = table.name.to_ascii_lowercase();
        if self.tables.contains_key(&key) {
            return Err(FixtureError::DuplicateTable(table.name));
        }
        self.tables.insert(key, table);
        Ok(())
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    /// Tables in dataset order
    pub fn tables(&self) -> impl DoubleEndedIterator<Item = &Table> {
        self.tables.values()
    }

    /// Table names in dataset order
    pub fn table_names(&self) -> Vec<String> {
        self.tables.values().map(|t| t.name.clone()).collect()
    }

    /// Number of tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Rebuild the dataset by applying `f` to every table, keeping order
    pub fn map_tables<F>(&self, mut f: F) -> Result<Dataset>
    where
        F: FnMut(&Table) -> Result<Table>,
    {
        let mut result = Dataset::new();
        for table in self.tables() {
            result.add_table(f(table)?)?;
        }
        Ok(result)
    }
}

impl IntoIterator for Dataset {
    type Item = Table;
    type IntoIter = indexmap::map::IntoValues<String, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_values()
    }
}
