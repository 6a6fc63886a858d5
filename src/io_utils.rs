//! Delimited-text adapter for the row interfaces.
//!
//! [`CsvRowSource`] and [`CsvRowSink`] let the binding engine read and write
//! plain delimited text through the `csv` crate. The cell delimiter is the
//! configured tag separator.
//!
//! - Readers are flexible: rows of differing width reach the engine, which
//!   reports them with their row number.
//! - Writers emit the header names, then the body rows, quoting every cell.
//! - The `-` path routes through standard input or output.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use log::{debug, info};

use crate::{
    config::BindConfig,
    printable_delimiter,
    rows::{Row, RowSink, RowSource, TablePayload},
};

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_writer<W>(writer: W, delimiter: u8) -> csv::Writer<W>
where
    W: Write,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .flexible(true);
    builder.from_writer(writer)
}

/// Pulls rows from delimited text.
pub struct CsvRowSource<R: Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
    rows_read: usize,
}

impl<R: Read> CsvRowSource<R> {
    pub fn from_reader(reader: R, config: &BindConfig) -> Result<Self> {
        let delimiter = config.delimiter()?;
        debug!(
            "Reading rows with delimiter '{}'",
            printable_delimiter(delimiter)
        );
        Ok(Self {
            reader: open_csv_reader(reader, delimiter),
            record: csv::StringRecord::new(),
            rows_read: 0,
        })
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

impl CsvRowSource<Box<dyn Read>> {
    pub fn from_path(path: &Path, config: &BindConfig) -> Result<Self> {
        let reader: Box<dyn Read> = if is_dash(path) {
            Box::new(std::io::stdin().lock())
        } else {
            Box::new(BufReader::new(
                File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
            ))
        };
        Self::from_reader(reader, config)
    }
}

impl<R: Read> RowSource for CsvRowSource<R> {
    fn read_row(&mut self) -> Result<Option<Row>> {
        let more = self
            .reader
            .read_record(&mut self.record)
            .with_context(|| format!("Reading row {}", self.rows_read + 1))?;
        if !more {
            return Ok(None);
        }
        self.rows_read += 1;
        Ok(Some(self.record.iter().map(str::to_string).collect()))
    }
}

/// Writes encoded tables as delimited text.
pub struct CsvRowSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvRowSink<W> {
    pub fn from_writer(writer: W, config: &BindConfig) -> Result<Self> {
        let delimiter = config.delimiter()?;
        Ok(Self {
            writer: open_csv_writer(writer, delimiter),
        })
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("Flushing output: {}", err.error()))
    }
}

impl CsvRowSink<Box<dyn Write>> {
    pub fn from_path(path: &Path, config: &BindConfig) -> Result<Self> {
        let writer: Box<dyn Write> = if is_dash(path) {
            Box::new(std::io::stdout())
        } else {
            Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
            ))
        };
        Self::from_writer(writer, config)
    }
}

impl<W: Write> RowSink for CsvRowSink<W> {
    fn write_table(&mut self, table: &TablePayload) -> Result<()> {
        self.writer
            .write_record(table.header.iter().map(|column| column.name.as_str()))
            .context("Writing header row")?;
        for (idx, row) in table.rows.iter().enumerate() {
            self.writer
                .write_record(row)
                .with_context(|| format!("Writing row {}", idx + 2))?;
        }
        self.writer.flush().context("Flushing output")?;
        info!(
            "Wrote {} row(s) across {} column(s)",
            table.rows.len(),
            table.header.len()
        );
        Ok(())
    }
}
