#![allow(dead_code)]

use std::path::{Path, PathBuf};

use dbfixture::FixtureConfig;
use rusqlite::Connection;
use tempfile::TempDir;

pub const EMP_SCHEMA: &str = "CREATE TABLE emp (
    empno    INTEGER PRIMARY KEY,
    ename    VARCHAR(10),
    job      VARCHAR(9),
    mgr      INTEGER,
    hiredate DATE,
    sal      DECIMAL(7,2)
);";

pub const DEPT_SCHEMA: &str = "CREATE TABLE dept (
    deptno INTEGER PRIMARY KEY,
    dname  VARCHAR(14),
    loc    VARCHAR(13)
);
CREATE TABLE emp (
    empno    INTEGER PRIMARY KEY,
    ename    VARCHAR(10),
    job      VARCHAR(9),
    mgr      INTEGER,
    hiredate DATE,
    sal      DECIMAL(7,2),
    deptno   INTEGER REFERENCES dept(deptno)
);";

pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Create a scratch database with `schema` and return its path
pub fn database(dir: &TempDir, schema: &str) -> PathBuf {
    let path = dir.path().join("test.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(schema).unwrap();
    path
}

/// Config for a scratch database reading fixtures from tests/fixtures
pub fn config(dir: &TempDir, schema: &str) -> FixtureConfig {
    FixtureConfig::new(database(dir, schema).to_string_lossy()).with_fixture_root(fixtures())
}

pub fn salary(config: &FixtureConfig, empno: i64) -> Option<i64> {
    let conn = Connection::open(&config.url).unwrap();
    conn.query_row("SELECT sal FROM emp WHERE empno = ?1", [empno], |row| row.get(0))
        .ok()
}

pub fn count(config: &FixtureConfig, table: &str) -> i64 {
    let conn = Connection::open(&config.url).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

pub const ITEM_SCHEMA: &str = "CREATE TABLE item (
    id    INTEGER PRIMARY KEY,
    code  VARCHAR(5),
    price VARCHAR(10)
);";

pub const CODES_SCHEMA: &str = "CREATE TABLE codes (k VARCHAR(5), v VARCHAR(5));";
