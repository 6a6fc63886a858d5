//! Row interfaces shared with external table codecs.
//!
//! A codec feeds the engine through [`RowSource`] (pull one row at a time,
//! `Ok(None)` at end-of-data) and receives encoded tables through [`RowSink`]
//! as a [`TablePayload`]: typed header columns plus string body rows.

use std::collections::VecDeque;

use anyhow::Result;

use crate::column_type::ColumnType;

pub type Row = Vec<String>;

pub trait RowSource {
    /// Next row, or `None` once the source is exhausted.
    fn read_row(&mut self) -> Result<Option<Row>>;

    fn read_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.read_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn read_row(&mut self) -> Result<Option<Row>> {
        (**self).read_row()
    }

    fn read_all(&mut self) -> Result<Vec<Row>> {
        (**self).read_all()
    }
}

/// Rows already materialized in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRows {
    rows: VecDeque<Row>,
}

impl MemoryRows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows: rows.into() }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl From<Vec<Row>> for MemoryRows {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl RowSource for MemoryRows {
    fn read_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }

    fn read_all(&mut self) -> Result<Vec<Row>> {
        Ok(self.rows.drain(..).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub label: String,
}

/// An encoded table ready for a codec.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TablePayload {
    pub header: Vec<HeaderColumn>,
    pub rows: Vec<Row>,
}

impl TablePayload {
    pub fn header_names(&self) -> Vec<String> {
        self.header.iter().map(|column| column.name.clone()).collect()
    }

    /// Header names followed by the body rows.
    pub fn to_rows(&self) -> Vec<Row> {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.header_names());
        rows.extend(self.rows.iter().cloned());
        rows
    }
}

pub trait RowSink {
    fn write_table(&mut self, table: &TablePayload) -> Result<()>;
}

impl<K: RowSink + ?Sized> RowSink for &mut K {
    fn write_table(&mut self, table: &TablePayload) -> Result<()> {
        (**self).write_table(table)
    }
}

/// Collects every written table in memory.
impl RowSink for Vec<TablePayload> {
    fn write_table(&mut self, table: &TablePayload) -> Result<()> {
        self.push(table.clone());
        Ok(())
    }
}
