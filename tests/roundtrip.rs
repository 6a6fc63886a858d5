mod common;

use common::{Address, Person, Respondent};
use proptest::prelude::*;
use rowbind::{BindConfig, Binder, CsvRowSink, CsvRowSource};

fn address_strategy() -> impl Strategy<Value = Address> {
    ("[A-Za-z ,;'\"-]{0,16}", proptest::option::of(any::<u32>()))
        .prop_map(|(city, zip)| Address { city, zip })
}

fn respondent_strategy() -> impl Strategy<Value = Respondent> {
    (
        any::<i16>(),
        -1.0e6f32..1.0e6f32,
        -1.0e12f64..1.0e12f64,
        address_strategy(),
        address_strategy(),
    )
        .prop_map(|(id, weight, income, home, work)| Respondent {
            id,
            weight,
            income,
            home,
            work: Some(Box::new(work)),
            internal_note: String::new(),
        })
}

proptest! {
    #[test]
    fn people_survive_encode_then_decode(
        people in proptest::collection::vec(
            ("\\PC{0,20}", any::<i32>()).prop_map(|(name, age)| Person { name, age }),
            0..8,
        )
    ) {
        let binder = Binder::new(BindConfig::strict());
        let payload = binder.encode(&people).expect("encode");
        let mut decoded: Vec<Person> = Vec::new();
        let count = binder.decode_rows(&payload.to_rows(), &mut decoded).expect("decode");
        prop_assert_eq!(count, people.len());
        prop_assert_eq!(decoded, people);
    }

    #[test]
    fn respondents_survive_delimited_text(
        records in proptest::collection::vec(respondent_strategy(), 1..5),
        separator in prop_oneof![Just(','), Just(';'), Just('\t'), Just('|')],
    ) {
        let config = BindConfig::permissive().with_tag_separator(separator);
        let binder = Binder::new(config.clone());

        let mut sink = CsvRowSink::from_writer(Vec::new(), &config).expect("sink");
        binder.encode_into(&records, &mut sink).expect("encode");
        let bytes = sink.into_inner().expect("flush");

        let mut source = CsvRowSource::from_reader(bytes.as_slice(), &config).expect("source");
        let mut decoded: Vec<Respondent> = Vec::new();
        binder.decode(&mut source, &mut decoded).expect("decode");
        prop_assert_eq!(decoded, records);
    }
}
