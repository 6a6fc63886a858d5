//! Error types for binding rows to records.
//!
//! [`BindError`] covers the whole taxonomy a decode or encode call can end
//! with:
//!
//! - schema errors (bad field declarations, no bindable fields, a field kind
//!   the codec cannot represent), raised before any row is looked at
//! - binding errors (unmatched fields, repeated header names), raised once
//!   after the header is inspected and listing every offending name
//! - capacity errors, raised before the destination is written
//! - per-cell coercion errors carrying 1-based row and column coordinates
//! - failures reported by the external row source or sink
//!
//! End-of-data is not an error: sources signal it with `Ok(None)`.

use thiserror::Error;

use crate::scalar::{CoercionError, ScalarKind};

/// Result alias used across the crate.
pub type BindResult<T> = Result<T, BindError>;

#[derive(Debug, Error)]
pub enum BindError {
    /// A record type declared a field the extractor cannot use.
    #[error("Invalid field declaration in {record}: {reason}")]
    Schema { record: &'static str, reason: String },

    /// The row set did not even contain a header.
    #[error("Empty row set given")]
    EmptyInput,

    /// The record type registers no bindable fields.
    #[error("No bindable fields declared on {record}")]
    NoBindableFields { record: &'static str },

    /// The destination cannot hold one element per body row.
    #[error(
        "{container} capacity problem: cannot store {needed} record(s) in {available} slot(s)"
    )]
    Capacity {
        container: &'static str,
        needed: usize,
        available: usize,
    },

    /// Fields whose keys appear nowhere in the header.
    #[error("Found unmatched struct field with tags {keys:?}")]
    UnmatchedFields { keys: Vec<String> },

    /// Header names that occur more than once.
    #[error("Repeated header name(s): {names:?}")]
    DuplicateHeaders { names: Vec<String> },

    /// A row whose width disagrees with the header (or the field count).
    #[error("Row {row} has {actual} column(s), expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A cell that could not be coerced into its field.
    #[error("Parse error on row {row}, column {column}: {source}")]
    Cell {
        row: usize,
        column: usize,
        #[source]
        source: CoercionError,
    },

    /// A field whose kind has no column type in the output table.
    #[error("Cannot convert type {kind} of field '{key}' into a column type")]
    UnsupportedKind { key: String, kind: ScalarKind },

    /// An access path that does not line up with the record it is applied to.
    #[error("Access path for field '{key}' does not match the record layout")]
    AccessPath { key: String },

    #[error("Row source failed")]
    Source(#[source] anyhow::Error),

    #[error("Row sink failed")]
    Sink(#[source] anyhow::Error),
}

impl BindError {
    /// Returns the 1-based (row, column) of a cell error.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            BindError::Cell { row, column, .. } => Some((*row, *column)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_error_reports_position_and_cause() {
        let err = BindError::Cell {
            row: 3,
            column: 2,
            source: CoercionError::new("abc", ScalarKind::Int32),
        };
        assert_eq!(err.position(), Some((3, 2)));
        let message = err.to_string();
        assert!(message.contains("row 3, column 2"), "{message}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn binding_errors_list_every_name() {
        let err = BindError::UnmatchedFields {
            keys: vec!["Age".to_string(), "Years".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Found unmatched struct field with tags [\"Age\", \"Years\"]"
        );
        assert_eq!(err.position(), None);
    }
}
