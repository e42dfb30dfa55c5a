//! Flat XML dataset parser
//!
//! Every child element of the `<dataset>` root is one row of the table it
//! is named after; its attributes are the row's cells:
//!
//! ```xml
//! <dataset>
//!   <dept deptno="10" dname="ACCOUNTING"/>
//!   <emp empno="7782" ename="CLARK" deptno="10"/>
//! </dataset>
//! ```
//!
//! Columns are the union of a table's attributes in first-seen order and a
//! missing attribute is null. An element without attributes declares an
//! empty table.

use std::fs;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use roxmltree::{Document, Node, ParsingOptions};

use crate::error::{FixtureError, Result};
use crate::model::{CellValue, Dataset, Table};

use super::Parser;

const ROOT_ELEMENT: &str = "dataset";

/// Parser for flat XML dataset files
pub struct XmlParser;

impl Parser for XmlParser {
    fn parse(&self, path: &Path) -> Result<Dataset> {
        let text = fs::read_to_string(path).map_err(|e| FixtureError::io(path, e))?;
        parse_document(path, &text)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("xml")
    }
}

#[derive(Default)]
struct PendingTable<'a> {
    columns: IndexSet<&'a str>,
    rows: Vec<(Node<'a, 'a>, usize)>,
}

fn parse_document(path: &Path, text: &str) -> Result<Dataset> {
    // Flat XML files usually carry a DOCTYPE naming their DTD
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options)?;

    let root = doc.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        return Err(FixtureError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "root element is <{}>, expected <{ROOT_ELEMENT}>",
                root.tag_name().name()
            ),
        });
    }

    let mut pending: IndexMap<&str, PendingTable<'_>> = IndexMap::new();
    for node in root.children().filter(Node::is_element) {
        let table = pending.entry(node.tag_name().name()).or_default();
        if node.attributes().next().is_none() {
            continue;
        }
        table.columns.extend(node.attributes().map(|a| a.name()));
        let line = doc.text_pos_at(node.range().start).row as usize;
        table.rows.push((node, line));
    }

    let mut dataset = Dataset::new();
    for (name, pending) in pending {
        let names: Vec<&str> = pending.columns.into_iter().collect();
        let mut table = Table::with_column_names(name, &names);
        for (node, line) in pending.rows {
            let cells = names
                .iter()
                .map(|col| match node.attribute(*col) {
                    Some(value) => CellValue::from(value),
                    None => CellValue::Null,
                })
                .collect();
            table.add_row(cells, line);
        }
        dataset.add_table(table)?;
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Dataset> {
        parse_document(Path::new("dataset.xml"), text)
    }

    #[test]
    fn test_parse_flat_xml() {
        let dataset = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <!DOCTYPE dataset SYSTEM "dataset.dtd">
            <dataset>
                <dept deptno="10" dname="ACCOUNTING"/>
                <emp empno="7839" ename="KING"/>
                <dept deptno="20" dname="R&amp;D"/>
                <emp empno="7566" ename="JONES" mgr="7839"/>
                <bonus/>
            </dataset>"#,
        )
        .unwrap();

        assert_eq!(dataset.table_names(), ["dept", "emp", "bonus"]);
        let emp = dataset.table("emp").unwrap();
        assert_eq!(emp.column_names().collect::<Vec<_>>(), ["empno", "ename", "mgr"]);
        assert_eq!(emp.value(0, "mgr"), Some(&CellValue::Null));
        assert_eq!(emp.value(1, "mgr"), Some(&CellValue::from("7839")));
        assert_eq!(emp.rows[0].source_line, 5);

        let dept = dataset.table("dept").unwrap();
        assert_eq!(dept.value(1, "dname"), Some(&CellValue::from("R&D")));
        assert_eq!(dataset.table("bonus").unwrap().row_count(), 0);
    }

    #[test]
    fn test_attribute_text_is_kept_verbatim() {
        let dataset = parse(r#"<dataset><item code="007" note=""/></dataset>"#).unwrap();
        let item = dataset.table("item").unwrap();
        assert_eq!(item.value(0, "code"), Some(&CellValue::from("007")));
        assert_eq!(item.value(0, "note"), Some(&CellValue::from("")));
    }

    #[test]
    fn test_rejects_other_roots_and_bad_xml() {
        let err = parse("<rows><emp empno=\"1\"/></rows>").unwrap_err();
        assert!(matches!(err, FixtureError::Parse { .. }));
        assert!(matches!(parse("<dataset><emp").unwrap_err(), FixtureError::Xml(_)));
    }
}
