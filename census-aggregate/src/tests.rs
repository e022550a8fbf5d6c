use std::fs;
use std::sync::Arc;

use bytes::Bytes;
use census_error::{CensusError, census_err};
use census_schema::{Record, SENTINEL, Schema, ZoneCode};
use census_store::{RecordStore, RecordStoreWriter};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::{aggregate, aggregate_to_store};

#[fixture]
fn schema() -> Arc<Schema> {
    Arc::new(Schema::from_names("KS101", &["usual_residents", "males", "females"]).unwrap())
}

fn zone(code: &str) -> ZoneCode {
    ZoneCode::new(code).unwrap()
}

fn ward(code: &ZoneCode) -> census_error::CensusResult<ZoneCode> {
    Ok(code.prefix(6))
}

fn store(schema: &Arc<Schema>, rows: &[(&str, [i32; 3])]) -> RecordStore<Bytes> {
    let mut writer = RecordStoreWriter::new(Vec::new(), schema.clone());
    for (id, (code, measures)) in (0u64..).zip(rows) {
        writer
            .append(&Record::new(id, zone(code), measures.to_vec()))
            .unwrap();
    }
    RecordStore::in_memory(writer.into_inner().unwrap(), schema.clone()).unwrap()
}

#[rstest]
fn sums_a_group(schema: Arc<Schema>) {
    let store = store(
        &schema,
        &[
            ("E00000001", [5, 2, 3]),
            ("E00000002", [7, 3, 4]),
            ("E00000003", [3, 1, 2]),
        ],
    );
    let aggregation = aggregate(&store, 0..3, ward).unwrap();

    assert_eq!(
        aggregation.records(),
        &[Record::new(0, zone("E00000"), vec![15, 6, 9])]
    );
    assert_eq!(aggregation.summary().records_read, 3);
    assert_eq!(aggregation.summary().groups, 1);
}

#[rstest]
fn groups_are_ranked_by_key(schema: Arc<Schema>) {
    // First seen order is W, S, E; output order must be E, S, W.
    let store = store(
        &schema,
        &[
            ("W00000001", [1, 1, 0]),
            ("S00088956", [2, 1, 1]),
            ("E00000001", [3, 2, 1]),
            ("W00000002", [4, 2, 2]),
        ],
    );
    let aggregation = aggregate(&store, 0..4, ward).unwrap();

    let keys = aggregation
        .records()
        .iter()
        .map(|r| (r.id(), r.zone().as_str().to_string()))
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            (0, "E00000".to_string()),
            (1, "S00088".to_string()),
            (2, "W00000".to_string()),
        ]
    );
    assert_eq!(
        aggregation.group(&zone("W00000")).unwrap().measures(),
        &[5, 3, 2]
    );
    assert!(aggregation.group(&zone("N00000")).is_none());
}

#[rstest]
fn conserves_measure_totals(schema: Arc<Schema>) {
    let rows = (0..200)
        .map(|i: i32| (format!("E0{:08}", i * 37 % 1000), [i, i / 2, i - i / 2]))
        .collect::<Vec<_>>();
    let borrowed = rows
        .iter()
        .map(|(code, m)| (code.as_str(), *m))
        .collect::<Vec<_>>();
    let store = store(&schema, &borrowed);
    let aggregation = aggregate(&store, 0..200, |code: &ZoneCode| Ok(code.prefix(8))).unwrap();

    for field in 0..3 {
        let input: i64 = rows.iter().map(|(_, m)| i64::from(m[field])).sum();
        let output: i64 = aggregation
            .records()
            .iter()
            .map(|r| i64::from(r.measures()[field]))
            .sum();
        assert_eq!(input, output);
    }
}

#[rstest]
fn unmapped_zones_form_their_own_group(schema: Arc<Schema>) {
    let store = store(
        &schema,
        &[
            ("E00000001", [1, 1, 0]),
            ("X99999999", [2, 1, 1]),
            ("X99999998", [4, 2, 2]),
        ],
    );
    let aggregation = aggregate(&store, 0..3, |code: &ZoneCode| {
        Ok(if code.as_str().starts_with('E') {
            zone("E02000001")
        } else {
            ZoneCode::unmapped()
        })
    })
    .unwrap();

    assert_eq!(aggregation.summary().unmapped_records, 2);
    let last = aggregation.records().last().unwrap();
    assert!(last.zone().is_unmapped());
    assert_eq!(last.id(), 1);
    assert_eq!(last.measures(), &[6, 3, 3]);
}

#[rstest]
fn unset_fields_do_not_corrupt_sums(schema: Arc<Schema>) {
    let store = store(
        &schema,
        &[
            ("N00000001", [SENTINEL, 1, SENTINEL]),
            ("N00000002", [10, 0, SENTINEL]),
        ],
    );
    let aggregation = aggregate(&store, 0..2, ward).unwrap();
    assert_eq!(
        aggregation.records()[0].measures(),
        &[10, 1, SENTINEL]
    );
}

#[rstest]
fn sub_range(schema: Arc<Schema>) {
    let store = store(
        &schema,
        &[
            ("E00000001", [1, 1, 0]),
            ("E00000002", [2, 1, 1]),
            ("E00000003", [4, 2, 2]),
        ],
    );
    let aggregation = aggregate(&store, 1..3, ward).unwrap();
    assert_eq!(aggregation.records()[0].measures(), &[6, 3, 3]);
    assert_eq!(aggregate(&store, 2..2, ward).unwrap().records().len(), 0);
}

#[rstest]
fn range_past_end(schema: Arc<Schema>) {
    let store = store(&schema, &[("E00000001", [1, 1, 0])]);
    assert!(matches!(
        aggregate(&store, 0..2, ward).unwrap_err(),
        CensusError::OutOfBounds(2, 0, 1, _)
    ));
}

#[rstest]
fn key_errors_abort(schema: Arc<Schema>) {
    let store = store(&schema, &[("E00000001", [1, 1, 0])]);
    let err = aggregate(&store, 0..1, |_: &ZoneCode| {
        Err(census_err!(IOError: std::io::Error::other("lookup unavailable")))
    })
    .unwrap_err();
    assert!(matches!(err.root(), CensusError::IOError(..)));
}

#[rstest]
fn overflow_aborts(schema: Arc<Schema>) {
    let store = store(
        &schema,
        &[("E00000001", [i32::MAX, 0, 0]), ("E00000002", [1, 0, 0])],
    );
    assert!(matches!(
        aggregate(&store, 0..2, ward).unwrap_err().root(),
        CensusError::Overflow(..)
    ));
}

#[rstest]
fn output_is_deterministic(schema: Arc<Schema>) {
    let dir = TempDir::new().unwrap();
    let rows = [
        ("S00088956", [2, 1, 1]),
        ("E00000001", [3, 2, 1]),
        ("W00000001", [1, 1, 0]),
        ("E00000002", [4, 2, 2]),
    ];
    let store = store(&schema, &rows);

    let first = dir.path().join("first.bin");
    let second = dir.path().join("second.bin");
    let summary = aggregate_to_store(&store, 0..4, ward, &first).unwrap();
    aggregate_to_store(&store, 0..4, ward, &second).unwrap();
    assert_eq!(summary.groups, 3);
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());

    let output = RecordStore::open(&first, schema.clone()).unwrap();
    assert_eq!(output.count().unwrap(), 3);
    assert!(output.audit_ids().unwrap().is_empty());
    assert_eq!(output.get(0).unwrap().measures(), &[7, 4, 3]);
}

#[rstest]
fn rewrites_existing_output(schema: Arc<Schema>) {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ward.bin");
    fs::write(&out, vec![0u8; 1000]).unwrap();

    let store = store(&schema, &[("E00000001", [1, 1, 0])]);
    aggregate_to_store(&store, 0..1, ward, &out).unwrap();
    assert_eq!(
        fs::metadata(&out).unwrap().len(),
        schema.record_len() as u64
    );
}
