//! Binding between header-and-row string tables and typed records.
//!
//! A record type registers its bindable fields once by implementing
//! [`Record`]. A [`Binder`], constructed with an explicit [`BindConfig`], then
//! decodes rows into containers of such records and encodes records back into
//! a [`TablePayload`] for an external codec.
//!
//! ```ignore
//! let binder = Binder::new(BindConfig::strict());
//! let mut people: Vec<Person> = Vec::new();
//! binder.decode_rows(&rows, &mut people)?;
//! let table = binder.encode(&people)?;
//! ```

pub mod column_type;
pub mod config;
pub mod container;
pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod error;
pub mod io_utils;
pub mod resolve;
pub mod rows;
pub mod scalar;

pub use column_type::ColumnType;
pub use config::{BindConfig, EmptyCellPolicy};
pub use container::{ContainerShape, Element, RecordContainer};
pub use decode::RecordStream;
pub use descriptor::{FieldDescriptor, FieldTag, PathStep, Record, RecordSchema, SchemaBuilder};
pub use error::{BindError, BindResult};
pub use io_utils::{CsvRowSink, CsvRowSource};
pub use resolve::ColumnBindings;
pub use rows::{HeaderColumn, MemoryRows, Row, RowSink, RowSource, TablePayload};
pub use scalar::{CoercionError, Scalar, ScalarKind};

/// Decodes and encodes records under one fixed configuration.
#[derive(Debug, Clone)]
pub struct Binder {
    config: BindConfig,
}

impl Binder {
    pub fn new(config: BindConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    char::from(delimiter).escape_default().to_string()
}
