mod common;

use std::panic::{self, AssertUnwindSafe};

use dbfixture::{
    CellValue, DatabaseOperation, FixtureError, FixtureRunner, FixtureSpec, SortOrder,
};
use tempfile::TempDir;

use common::{config, count, salary, CODES_SCHEMA, DEPT_SCHEMA, EMP_SCHEMA, ITEM_SCHEMA};

fn emp_spec() -> FixtureSpec {
    FixtureSpec::new("emp.csv").with_null_value("[NULL]")
}

fn raise_jones(ctx: &dbfixture::FixtureContext<'_>) -> dbfixture::Result<()> {
    ctx.connection()?
        .execute("UPDATE emp SET sal = 3000 WHERE empno = 7566", [])?;
    Ok(())
}

#[test]
fn test_expected_dataset_matches_with_excluded_key() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));
    let spec = emp_spec()
        .with_expected("emp_after.csv")
        .with_exclude_columns(["empno"]);

    runner.run(&spec, raise_jones).unwrap();
    assert_eq!(salary(runner.config(), 7566), Some(3000));
}

#[test]
fn test_expected_dataset_mismatch() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));
    let spec = emp_spec()
        .with_expected("emp_after.csv")
        .with_exclude_columns(["empno"]);

    let err = runner.run(&spec, |_| Ok::<_, FixtureError>(())).unwrap_err();
    assert!(err.is_mismatch());
    assert!(err.to_string().contains("expected <3000> but was <2975>"));
}

#[test]
fn test_key_column_compared_without_exclusion() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));
    let spec = emp_spec().with_expected("emp_after.csv");

    let err = runner.run(&spec, raise_jones).unwrap_err();
    assert!(err.is_mismatch());
}

#[test]
fn test_successful_body_is_committed() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));

    runner.run(&emp_spec(), raise_jones).unwrap();
    assert_eq!(count(runner.config(), "emp"), 3);
    assert_eq!(salary(runner.config(), 7566), Some(3000));
}

#[test]
fn test_failing_body_is_rolled_back() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));

    let err = runner
        .run(&emp_spec(), |ctx| -> dbfixture::Result<()> {
            raise_jones(ctx)?;
            Err(FixtureError::Config("boom".into()))
        })
        .unwrap_err();

    let source = err.into_test_error().unwrap();
    assert_eq!(source.to_string(), "configuration error: boom");
    assert_eq!(salary(runner.config(), 7566), Some(2975));
}

#[test]
fn test_panicking_body_is_rolled_back() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        runner.run(&emp_spec(), |ctx| -> dbfixture::Result<()> {
            raise_jones(ctx)?;
            panic!("assertion failed in test body");
        })
    }));

    assert!(result.is_err());
    assert_eq!(salary(runner.config(), 7566), Some(2975));
}

#[test]
fn test_body_without_connection() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));

    runner
        .run(&emp_spec(), |ctx| {
            assert!(!ctx.has_connection());
            Ok::<_, FixtureError>(())
        })
        .unwrap();
    assert_eq!(count(runner.config(), "emp"), 3);
}

#[test]
fn test_clean_insert_replaces_existing_rows() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));

    runner.run(&emp_spec(), raise_jones).unwrap();
    runner.run(&emp_spec(), |_| Ok::<_, FixtureError>(())).unwrap();
    assert_eq!(count(runner.config(), "emp"), 3);
    assert_eq!(salary(runner.config(), 7566), Some(2975));
}

#[test]
fn test_null_sentinel_loads_nulls() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));

    runner.run(&emp_spec(), |_| Ok::<_, FixtureError>(())).unwrap();

    let conn = runner.data_source().connection().unwrap();
    let emp = dbfixture::database::read_table(&conn, "emp").unwrap();
    assert_eq!(emp.value(2, "ename"), Some(&CellValue::from("KING")));
    assert_eq!(emp.value(2, "mgr"), Some(&CellValue::Null));
}

#[test]
fn test_json_fixture_matches_csv_fixture() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));
    let spec = FixtureSpec::new("emp.json")
        .with_expected("emp.csv")
        .with_null_value("[NULL]");

    runner.run(&spec, |_| Ok::<_, FixtureError>(())).unwrap();
}

#[test]
fn test_xml_fixture_matches_csv_fixture() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));
    let spec = FixtureSpec::new("emp.xml")
        .with_expected("emp.csv")
        .with_null_value("[NULL]");

    runner.run(&spec, |_| Ok::<_, FixtureError>(())).unwrap();
    assert_eq!(salary(runner.config(), 7369), Some(800));
}

#[test]
fn test_text_columns_keep_fixture_text() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, ITEM_SCHEMA));
    let spec = FixtureSpec::new("item.csv").with_expected("item.csv");

    runner
        .run(&spec, |ctx| -> dbfixture::Result<()> {
            let (code, price): (String, String) = ctx.connection()?.query_row(
                "SELECT code, price FROM item WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            assert_eq!(code, "007");
            assert_eq!(price, "1.50");
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_numeric_looking_text_keys_compare_sorted() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, CODES_SCHEMA));
    let spec = FixtureSpec::new("codes.csv").with_expected("codes.csv");

    runner.run(&spec, |_| Ok::<_, FixtureError>(())).unwrap();
    assert_eq!(count(runner.config(), "codes"), 2);
}

#[test]
fn test_csv_directory_fixture() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, DEPT_SCHEMA));
    let spec = FixtureSpec::new("company")
        .with_expected("company")
        .with_sort(SortOrder::None);

    runner
        .run(&spec, |ctx| {
            let research: i64 = ctx.connection()?.query_row(
                "SELECT COUNT(*) FROM emp WHERE deptno = 20",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(research, 1);
            Ok::<_, FixtureError>(())
        })
        .unwrap();
    assert_eq!(count(runner.config(), "dept"), 2);
    assert_eq!(count(runner.config(), "emp"), 2);
}

#[test]
fn test_delete_all_empties_dataset_tables() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, DEPT_SCHEMA));

    runner
        .run(&FixtureSpec::new("company"), |_| Ok::<_, FixtureError>(()))
        .unwrap();
    runner
        .run(
            &FixtureSpec::new("company").with_operation(DatabaseOperation::DeleteAll),
            |_| Ok::<_, FixtureError>(()),
        )
        .unwrap();

    assert_eq!(count(runner.config(), "dept"), 0);
    assert_eq!(count(runner.config(), "emp"), 0);
}

#[test]
fn test_missing_init_fixture() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));

    let err = runner
        .run(&FixtureSpec::new("absent.csv"), |_| Ok::<_, FixtureError>(()))
        .unwrap_err();
    assert!(matches!(err, FixtureError::FixtureNotFound(_)));
}

#[test]
fn test_unsupported_fixture_format() {
    let dir = TempDir::new().unwrap();
    let runner = FixtureRunner::new(config(&dir, EMP_SCHEMA));

    let err = runner
        .run(&FixtureSpec::new("emp.yaml"), |_| Ok::<_, FixtureError>(()))
        .unwrap_err();
    assert!(matches!(err, FixtureError::UnsupportedFormat(ext) if ext == "yaml"));
}
