//! Column metadata and type information

use serde::{Deserialize, Serialize};

/// Cell type for a column, inferred from fixture data or declared by the database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Null,
    Bool,
    Int,
    Float,
    String,
    Date,
    DateTime,
    Bytes,
    Mixed,
}

impl CellType {
    /// Widen the type to accommodate another type
    pub fn widen(self, other: CellType) -> CellType {
        if self == other {
            return self;
        }

        match (self, other) {
            (CellType::Null, t) | (t, CellType::Null) => t,
            (CellType::Int, CellType::Float) | (CellType::Float, CellType::Int) => CellType::Float,
            (CellType::Date, CellType::DateTime) | (CellType::DateTime, CellType::Date) => {
                CellType::DateTime
            }
            _ => CellType::Mixed,
        }
    }

    /// Map a SQLite declared column type to a cell type.
    ///
    /// Follows SQLite's affinity rules, with date/time and boolean
    /// declarations recognised before the generic ones.
    pub fn from_declared(decl: &str) -> CellType {
        let decl = decl.to_ascii_uppercase();
        if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
            CellType::DateTime
        } else if decl.contains("DATE") {
            CellType::Date
        } else if decl.contains("BOOL") {
            CellType::Bool
        } else if decl.contains("INT") {
            CellType::Int
        } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
            CellType::String
        } else if decl.contains("BLOB") {
            CellType::Bytes
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            CellType::Float
        } else {
            // NUMERIC affinity or no declared type: values keep their storage class
            CellType::Mixed
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellType::Null => write!(f, "null"),
            CellType::Bool => write!(f, "bool"),
            CellType::Int => write!(f, "int"),
            CellType::Float => write!(f, "float"),
            CellType::String => write!(f, "string"),
            CellType::Date => write!(f, "date"),
            CellType::DateTime => write!(f, "datetime"),
            CellType::Bytes => write!(f, "bytes"),
            CellType::Mixed => write!(f, "mixed"),
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (from header or database)
    pub name: String,
    /// Column index (0-based position)
    pub index: usize,
    /// Inferred or declared type
    pub cell_type: CellType,
    /// Part of the table's primary key
    pub primary_key: bool,
}

impl Column {
    /// Create a new column with name and index
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            cell_type: CellType::Null,
            primary_key: false,
        }
    }

    /// Create a column with a specified type
    pub fn with_type(name: impl Into<String>, index: usize, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            index,
            cell_type,
            primary_key: false,
        }
    }

    /// Check the column name, ignoring ASCII case
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_declared() {
        assert_eq!(CellType::from_declared("INTEGER"), CellType::Int);
        assert_eq!(CellType::from_declared("varchar(10)"), CellType::String);
        assert_eq!(CellType::from_declared("DATE"), CellType::Date);
        assert_eq!(CellType::from_declared("TIMESTAMP"), CellType::DateTime);
        assert_eq!(CellType::from_declared("DECIMAL(7,2)"), CellType::Mixed);
        assert_eq!(CellType::from_declared(""), CellType::Mixed);
    }

    #[test]
    fn test_widen() {
        assert_eq!(CellType::Null.widen(CellType::Int), CellType::Int);
        assert_eq!(CellType::Int.widen(CellType::Float), CellType::Float);
        assert_eq!(CellType::String.widen(CellType::Int), CellType::Mixed);
    }
}
