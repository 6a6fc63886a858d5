mod common;

use std::ops::ControlFlow;

use common::{Person, init_logging, row, table};
use rowbind::{BindConfig, BindError, Binder, MemoryRows, Row, RowSource};

fn source(body: &[&[&str]]) -> MemoryRows {
    MemoryRows::new(table(&["Name", "Age"], body))
}

#[test]
fn stream_yields_records_in_row_order() {
    init_logging();
    let binder = Binder::new(BindConfig::strict());
    let mut stream = binder
        .stream::<Person, _>(source(&[&["Ann", "30"], &["Bo", "41"]]))
        .expect("stream");
    assert_eq!(stream.bindings().width(), 2);

    let first = stream.next().expect("first").expect("decoded");
    assert_eq!(first.name, "Ann");
    assert_eq!(stream.rows_read(), 2);

    let rest = stream.collect::<Result<Vec<_>, _>>().expect("rest");
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].age, 41);
}

#[test]
fn stream_stops_after_first_error() {
    let binder = Binder::new(BindConfig::strict());
    let mut stream = binder
        .stream::<Person, _>(source(&[&["Ann", "30"], &["Bo", "abc"], &["Cy", "9"]]))
        .expect("stream");

    assert!(stream.next().expect("first").is_ok());
    let err = stream.next().expect("second").unwrap_err();
    assert_eq!(err.position(), Some((3, 2)));
    assert!(stream.next().is_none());
    assert!(stream.next().is_none());
}

#[test]
fn stream_checks_header_up_front() {
    let binder = Binder::new(BindConfig::strict());

    let err = binder
        .stream::<Person, _>(MemoryRows::default())
        .err()
        .expect("empty source");
    assert!(matches!(err, BindError::EmptyInput));

    let err = binder
        .stream::<Person, _>(MemoryRows::new(table(&["Name"], &[&["Ann"]])))
        .err()
        .expect("unmatched");
    assert!(matches!(err, BindError::UnmatchedFields { .. }), "{err}");
}

#[test]
fn decode_each_honours_early_break() {
    let binder = Binder::new(BindConfig::strict());
    let mut names = Vec::new();
    let delivered = binder
        .decode_each(
            source(&[&["Ann", "30"], &["Bo", "41"], &["Cy", "9"]]),
            |person: Person| {
                names.push(person.name);
                if names.len() == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        )
        .expect("decode");
    assert_eq!(delivered, 2);
    assert_eq!(names, vec!["Ann", "Bo"]);
}

#[test]
fn decode_each_reports_malformed_rows() {
    let binder = Binder::new(BindConfig::strict());
    let mut seen = 0;
    let err = binder
        .decode_each(
            source(&[&["Ann", "30"], &["Bo", "41", "extra"]]),
            |_: Person| {
                seen += 1;
                ControlFlow::Continue(())
            },
        )
        .unwrap_err();
    assert_eq!(seen, 1);
    assert!(
        matches!(err, BindError::RowLength { row: 3, .. }),
        "{err}"
    );
}

/// Fails after handing out a fixed number of rows.
struct FlakySource {
    rows: Vec<Row>,
}

impl RowSource for FlakySource {
    fn read_row(&mut self) -> anyhow::Result<Option<Row>> {
        if self.rows.is_empty() {
            anyhow::bail!("connection reset");
        }
        Ok(Some(self.rows.remove(0)))
    }
}

#[test]
fn source_failures_surface_as_source_errors() {
    let binder = Binder::new(BindConfig::strict());
    let flaky = FlakySource {
        rows: vec![row(&["Name", "Age"]), row(&["Ann", "30"])],
    };
    let results = binder
        .stream::<Person, _>(flaky)
        .expect("stream")
        .collect::<Vec<_>>();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    match &results[1] {
        Err(BindError::Source(err)) => assert!(err.to_string().contains("connection reset")),
        other => panic!("unexpected result: {other:?}"),
    }

    let mut failing = FlakySource { rows: Vec::new() };
    let mut out: Vec<Person> = Vec::new();
    let err = binder.decode(&mut failing, &mut out).unwrap_err();
    assert!(matches!(err, BindError::Source(_)), "{err}");
}

#[test]
fn boxed_elements_stream_too() {
    let binder = Binder::new(BindConfig::strict());
    let records = binder
        .stream::<Option<Box<Person>>, _>(source(&[&["Ann", "30"]]))
        .expect("stream")
        .collect::<Result<Vec<_>, _>>()
        .expect("decode");
    assert_eq!(records[0].as_deref().map(|p| p.age), Some(30));
}
