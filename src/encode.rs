//! Encoding records into a table payload.
//!
//! The header is derived once from the record type: one column per field,
//! named after the field's primary key and typed with its [`ColumnType`].
//! Each record then becomes one row of rendered cells. An unset optional
//! record on a field's path renders as an empty cell for that field only.

use log::debug;

use crate::{
    Binder,
    column_type::ColumnType,
    container::Element,
    decode::ensure_bindable,
    descriptor::RecordSchema,
    error::{BindError, BindResult},
    rows::{HeaderColumn, Row, RowSink, TablePayload},
};

impl Binder {
    pub fn encode<E: Element>(&self, records: &[E]) -> BindResult<TablePayload> {
        let schema = RecordSchema::of::<E::Record>()?;
        ensure_bindable(&schema)?;
        let header = encode_header(&schema)?;
        let rows = records
            .iter()
            .map(|element| encode_record(&schema, element))
            .collect::<BindResult<Vec<_>>>()?;
        debug!(
            "Encoded {} record(s) of {} into {} column(s)",
            rows.len(),
            schema.record_name(),
            header.len()
        );
        Ok(TablePayload { header, rows })
    }

    /// Encodes `records` and hands the table to `sink`. Returns the number of
    /// body rows written.
    pub fn encode_into<E, K>(&self, records: &[E], sink: &mut K) -> BindResult<usize>
    where
        E: Element,
        K: RowSink + ?Sized,
    {
        let payload = self.encode(records)?;
        sink.write_table(&payload).map_err(BindError::Sink)?;
        Ok(payload.rows.len())
    }
}

/// Header columns for a record schema, failing on the first field whose kind
/// has no column type.
pub fn encode_header(schema: &RecordSchema) -> BindResult<Vec<HeaderColumn>> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let column_type =
                ColumnType::for_kind(field.kind()).ok_or_else(|| BindError::UnsupportedKind {
                    key: field.primary_key().to_string(),
                    kind: field.kind(),
                })?;
            Ok(HeaderColumn {
                name: field.primary_key().to_string(),
                column_type,
                label: field.primary_key().to_string(),
            })
        })
        .collect()
}

fn encode_record<E: Element>(schema: &RecordSchema, element: &E) -> BindResult<Row> {
    match element.record() {
        Some(record) => schema
            .fields()
            .iter()
            .map(|field| field.read_cell(record))
            .collect(),
        None => Ok(vec![String::new(); schema.len()]),
    }
}
