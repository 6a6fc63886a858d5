//! Decoding string rows into record containers.
//!
//! Three entry points share one per-row routine:
//!
//! - [`Binder::decode_rows`] (and [`Binder::decode`], which first drains a
//!   [`RowSource`]) treats the first row as the header and fills one element
//!   per body row
//! - [`Binder::decode_without_headers`] binds columns to fields by position
//! - [`Binder::stream`] / [`Binder::decode_each`] read the header once and then
//!   pull body rows one at a time, yielding each record as soon as it is built
//!
//! Row numbers in errors are 1-based with the header counted as row 1; column
//! numbers are 1-based.

use std::{iter::FusedIterator, marker::PhantomData, ops::ControlFlow, sync::Arc};

use log::{debug, trace};

use crate::{
    Binder,
    config::{BindConfig, EmptyCellPolicy},
    container::{Element, RecordContainer},
    descriptor::{FieldDescriptor, RecordSchema, WriteFailure},
    error::{BindError, BindResult},
    resolve::ColumnBindings,
    rows::{Row, RowSource},
};

impl Binder {
    /// Reads every row from `source` and decodes them into `out`.
    pub fn decode<S, C>(&self, source: &mut S, out: &mut C) -> BindResult<usize>
    where
        S: RowSource + ?Sized,
        C: RecordContainer + ?Sized,
    {
        let rows = source.read_all().map_err(BindError::Source)?;
        self.decode_rows(&rows, out)
    }

    /// Decodes a header row followed by body rows into `out`, returning the
    /// number of records written.
    pub fn decode_rows<C>(&self, rows: &[Row], out: &mut C) -> BindResult<usize>
    where
        C: RecordContainer + ?Sized,
    {
        let schema = RecordSchema::of::<<C::Item as Element>::Record>()?;
        let (header, body) = rows.split_first().ok_or(BindError::EmptyInput)?;
        out.ensure_rows(body.len())?;
        ensure_bindable(&schema)?;
        let bindings = ColumnBindings::resolve(header, &schema, &self.config)?;

        for (idx, row) in body.iter().enumerate() {
            let element = populate(&self.config, &schema, &bindings, row, idx + 2)?;
            store(out, idx, element)?;
        }
        debug!(
            "Decoded {} record(s) of {} from {} column(s)",
            body.len(),
            schema.record_name(),
            header.len()
        );
        Ok(body.len())
    }

    /// Decodes rows that carry no header: column N feeds the Nth declared
    /// field and every row must have exactly one cell per field.
    pub fn decode_without_headers<C>(&self, rows: &[Row], out: &mut C) -> BindResult<usize>
    where
        C: RecordContainer + ?Sized,
    {
        let schema = RecordSchema::of::<<C::Item as Element>::Record>()?;
        if rows.is_empty() {
            return Err(BindError::EmptyInput);
        }
        out.ensure_rows(rows.len())?;
        ensure_bindable(&schema)?;
        let bindings = ColumnBindings::positional(&schema);

        for (idx, row) in rows.iter().enumerate() {
            let element = populate(&self.config, &schema, &bindings, row, idx + 1)?;
            store(out, idx, element)?;
        }
        debug!(
            "Decoded {} headerless record(s) of {}",
            rows.len(),
            schema.record_name()
        );
        Ok(rows.len())
    }

    /// Reads the header from `source` and returns an iterator that decodes
    /// the remaining rows one at a time.
    pub fn stream<E, S>(&self, mut source: S) -> BindResult<RecordStream<S, E>>
    where
        E: Element,
        S: RowSource,
    {
        let schema = RecordSchema::of::<E::Record>()?;
        let header = source
            .read_row()
            .map_err(BindError::Source)?
            .ok_or(BindError::EmptyInput)?;
        ensure_bindable(&schema)?;
        let bindings = ColumnBindings::resolve(&header, &schema, &self.config)?;
        Ok(RecordStream {
            config: self.config.clone(),
            source,
            schema,
            bindings,
            next_row: 2,
            finished: false,
            _element: PhantomData,
        })
    }

    /// Streams records from `source` into `deliver` until the source runs dry
    /// or `deliver` breaks. Returns the number of records delivered.
    pub fn decode_each<E, S, F>(&self, source: S, mut deliver: F) -> BindResult<usize>
    where
        E: Element,
        S: RowSource,
        F: FnMut(E) -> ControlFlow<()>,
    {
        let mut delivered = 0;
        for record in self.stream::<E, S>(source)? {
            let record = record?;
            delivered += 1;
            if deliver(record).is_break() {
                debug!("Consumer stopped the stream after {delivered} record(s)");
                break;
            }
        }
        Ok(delivered)
    }
}

/// Records decoded lazily from a [`RowSource`].
///
/// The iterator ends at end-of-data and after the first error.
pub struct RecordStream<S, E> {
    config: BindConfig,
    source: S,
    schema: Arc<RecordSchema>,
    bindings: ColumnBindings,
    next_row: usize,
    finished: bool,
    _element: PhantomData<fn() -> E>,
}

impl<S, E> RecordStream<S, E> {
    pub fn bindings(&self) -> &ColumnBindings {
        &self.bindings
    }

    /// Rows consumed so far, header included.
    pub fn rows_read(&self) -> usize {
        self.next_row - 1
    }
}

impl<S: RowSource, E: Element> Iterator for RecordStream<S, E> {
    type Item = BindResult<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let row = match self.source.read_row() {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.finished = true;
                return None;
            }
            Err(err) => {
                self.finished = true;
                return Some(Err(BindError::Source(err)));
            }
        };
        let row_number = self.next_row;
        self.next_row += 1;
        let result = populate(&self.config, &self.schema, &self.bindings, &row, row_number);
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

impl<S: RowSource, E: Element> FusedIterator for RecordStream<S, E> {}

pub(crate) fn ensure_bindable(schema: &RecordSchema) -> BindResult<()> {
    if schema.is_empty() {
        return Err(BindError::NoBindableFields {
            record: schema.record_name(),
        });
    }
    Ok(())
}

fn store<C>(out: &mut C, index: usize, element: C::Item) -> BindResult<()>
where
    C: RecordContainer + ?Sized,
{
    let available = out.len();
    let slot = out.slot_mut(index).ok_or(BindError::Capacity {
        container: std::any::type_name::<C>(),
        needed: index + 1,
        available,
    })?;
    *slot = element;
    Ok(())
}

fn skips_empty(config: &BindConfig, field: &FieldDescriptor, cell: &str) -> bool {
    cell.is_empty()
        && (field.omit_empty()
            || (config.empty_cells == EmptyCellPolicy::SkipEmpty && field.kind().is_numeric()))
}

fn populate<E: Element>(
    config: &BindConfig,
    schema: &RecordSchema,
    bindings: &ColumnBindings,
    row: &[String],
    row_number: usize,
) -> BindResult<E> {
    if row.len() != bindings.width() {
        return Err(BindError::RowLength {
            row: row_number,
            expected: bindings.width(),
            actual: row.len(),
        });
    }
    trace!("Decoding row {row_number}");
    let mut element = E::vacant();
    for (column, field_idx) in bindings.iter() {
        let field = &schema.fields()[field_idx];
        let cell = row[column].as_str();
        if skips_empty(config, field, cell) {
            continue;
        }
        field
            .write_cell(element.record_mut(), cell)
            .map_err(|failure| match failure {
                WriteFailure::Coercion(source) => BindError::Cell {
                    row: row_number,
                    column: column + 1,
                    source,
                },
                WriteFailure::Layout => field.layout_error(),
            })?;
    }
    Ok(element)
}
