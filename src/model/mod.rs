//! Data model for datasets, tables and cells

mod dataset;
mod schema;
mod table;

pub use dataset::Dataset;
pub use schema::{CellType, Column};
pub use table::{CellValue, Row, Table};

pub(crate) use table::parse_temporal;
