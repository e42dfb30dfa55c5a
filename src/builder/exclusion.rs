//! Column exclusion rules

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::model::{Column, Table};

/// A column name to exclude, optionally with `*` and `?` wildcards.
/// Matching ignores ASCII case.
#[derive(Debug, Clone)]
pub struct ColumnPattern {
    name: String,
    wildcard: Option<Regex>,
}

impl ColumnPattern {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let wildcard = if name.contains(['*', '?']) {
            Regex::new(&wildcard_regex(&name)).ok()
        } else {
            None
        };
        Self { name, wildcard }
    }

    /// Check a column name against this pattern
    pub fn matches(&self, column: &str) -> bool {
        match &self.wildcard {
            Some(re) => re.is_match(column),
            None => self.name.eq_ignore_ascii_case(column),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

fn wildcard_regex(pattern: &str) -> String {
    let mut re = String::from("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    re
}

/// Exclusion set: bare names apply to every table, `table.column`
/// names only to the named table.
#[derive(Debug, Clone, Default)]
pub struct ExcludeColumns {
    global: Vec<ColumnPattern>,
    scoped: FxHashMap<String, Vec<ColumnPattern>>,
}

impl ExcludeColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one exclusion spec (`"empno"` or `"emp.empno"`).
    ///
    /// The spec is split at its first dot, unless the dot leads. Empty
    /// specs are ignored.
    pub fn add(&mut self, spec: &str) {
        if spec.is_empty() {
            return;
        }
        match spec.find('.') {
            Some(dot) if dot > 0 => {
                let table = spec[..dot].to_ascii_lowercase();
                self.scoped
                    .entry(table)
                    .or_default()
                    .push(ColumnPattern::new(&spec[dot + 1..]));
            }
            _ => self.global.push(ColumnPattern::new(spec)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.scoped.is_empty()
    }

    /// Effective patterns for a table: global ones plus the table's own
    pub fn for_table<'a>(&'a self, table: &str) -> impl Iterator<Item = &'a ColumnPattern> {
        let scoped = self
            .scoped
            .get(&table.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.global.iter().chain(scoped)
    }

    /// Check whether a column of a table is excluded
    pub fn is_excluded(&self, table: &str, column: &str) -> bool {
        self.for_table(table).any(|p| p.matches(column))
    }

    /// Rebuild a table without its excluded columns
    pub fn apply(&self, table: &Table) -> Result<Table> {
        table.check_arity()?;

        let kept: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !self.is_excluded(&table.name, &c.name))
            .map(|(idx, _)| idx)
            .collect();

        if kept.len() == table.column_count() {
            return Ok(table.clone());
        }

        let columns = kept
            .iter()
            .enumerate()
            .map(|(i, &idx)| Column {
                index: i,
                ..table.columns[idx].clone()
            })
            .collect();

        let mut result = Table::new(table.name.clone(), columns);
        for row in &table.rows {
            let cells = kept.iter().map(|&idx| row.cells[idx].clone()).collect();
            result.add_row(cells, row.source_line);
        }
        Ok(result)
    }
}
