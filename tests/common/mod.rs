#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rowbind::{Record, Row, SchemaBuilder};
use tempfile::{TempDir, tempdir};

static LOGGER: OnceLock<()> = OnceLock::new();

/// Routes `log` output through the test harness; `RUST_LOG` controls verbosity.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Builds a row from string literals.
pub fn row(cells: &[&str]) -> Row {
    cells.iter().map(|cell| cell.to_string()).collect()
}

/// Builds a header row followed by body rows.
pub fn table(header: &[&str], body: &[&[&str]]) -> Vec<Row> {
    let mut rows = vec![row(header)];
    rows.extend(body.iter().map(|cells| row(cells)));
    rows
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: i32,
}

impl Record for Person {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("name", "Name", |p| &p.name, |p| &mut p.name)
            .field("age", "Age", |p| &p.age, |p| &mut p.age);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Address {
    pub city: String,
    pub zip: Option<u32>,
}

impl Record for Address {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("city", "City", |a| &a.city, |a| &mut a.city)
            .field("zip", "Zip,omitempty", |a| &a.zip, |a| &mut a.zip);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Respondent {
    pub id: i16,
    pub weight: f32,
    pub income: f64,
    pub home: Address,
    pub work: Option<Box<Address>>,
    pub internal_note: String,
}

impl Record for Respondent {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("id", "Id,ID", |r| &r.id, |r| &mut r.id)
            .field("weight", "Weight,omitempty", |r| &r.weight, |r| &mut r.weight)
            .field("income", "Income", |r| &r.income, |r| &mut r.income)
            .nest("home", |r| &r.home, |r| &mut r.home)
            .nest_boxed("work", |r| &r.work, |r| &mut r.work)
            .skip("internal_note");
    }
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
