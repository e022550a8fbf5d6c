//! The built-in census tables and their regional source layouts.
//!
//! Column indices count from zero, with column 0 holding the quoted zone code. Each layout is the
//! column order this catalog expects for a region's files. A measure a layout splits across
//! several columns is summed, and a measure a layout has no column for is left unset. Files laid
//! out any other way need a JSON table definition instead.

use std::collections::BTreeMap;

use census_error::{CensusResult, census_bail};

use crate::ColumnSource::{Column, Sum, Unset};
use crate::{ColumnSource, Region, Schema, TableDef, TextLayout};

/// The names of every built-in table.
pub const TABLE_NAMES: [&str; 5] = ["KS101", "KS102", "KS105", "KS401", "QS104"];

/// Look up a built-in table by name, ignoring case.
pub fn table(name: &str) -> CensusResult<TableDef> {
    match name.to_ascii_uppercase().as_str() {
        "KS101" => ks101(),
        "KS102" => ks102(),
        "KS105" => ks105(),
        "KS401" => ks401(),
        "QS104" => qs104(),
        _ => census_bail!(
            "unknown table {}, expected one of {}",
            name,
            TABLE_NAMES.join(", ")
        ),
    }
}

/// Every built-in table.
pub fn all() -> CensusResult<Vec<TableDef>> {
    TABLE_NAMES.iter().map(|name| table(name)).collect()
}

fn define(
    name: &str,
    fields: &[&str],
    layouts: impl IntoIterator<Item = (Region, Vec<ColumnSource>)>,
) -> CensusResult<TableDef> {
    TableDef::try_new(
        Schema::from_names(name, fields)?,
        layouts
            .into_iter()
            .map(|(region, columns)| (region, TextLayout::new(columns)))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn columns(range: impl IntoIterator<Item = usize>) -> Vec<ColumnSource> {
    range.into_iter().map(Column).collect()
}

/// KS101: usual resident population.
pub fn ks101() -> CensusResult<TableDef> {
    define(
        "KS101",
        &[
            "all_usual_residents",
            "males",
            "females",
            "lives_in_household",
            "lives_in_communal_establishment",
            "schoolchild_or_student_non_term_time",
        ],
        [
            (Region::EnglandWales, columns(1..=6)),
            // The Scottish layout has no term-time student column.
            (
                Region::Scotland,
                vec![Column(1), Column(2), Column(3), Column(4), Column(5), Unset],
            ),
            // The Northern Irish layout puts residence type before sex.
            (
                Region::NorthernIreland,
                vec![Column(1), Column(5), Column(6), Column(2), Column(3), Column(4)],
            ),
        ],
    )
}

/// KS102: age structure.
pub fn ks102() -> CensusResult<TableDef> {
    define(
        "KS102",
        &[
            "all_usual_residents",
            "age_0_to_4",
            "age_5_to_7",
            "age_8_to_9",
            "age_10_to_14",
            "age_15",
            "age_16_to_17",
            "age_18_to_19",
            "age_20_to_24",
            "age_25_to_29",
            "age_30_to_44",
            "age_45_to_59",
            "age_60_to_64",
            "age_65_to_74",
            "age_75_to_84",
            "age_85_to_89",
            "age_90_and_over",
        ],
        [
            (Region::EnglandWales, columns(1..=17)),
            // The Scottish layout has separate 16 and 17 year old columns.
            (
                Region::Scotland,
                [columns(1..=6), vec![Sum(vec![7, 8])], columns(9..=18)].concat(),
            ),
            // The Northern Irish layout has the total last.
            (
                Region::NorthernIreland,
                [vec![Column(17)], columns(1..=16)].concat(),
            ),
        ],
    )
}

/// KS105: household composition.
pub fn ks105() -> CensusResult<TableDef> {
    define(
        "KS105",
        &[
            "all_households",
            "one_person_household",
            "one_family_household",
            "married_couple_household",
            "cohabiting_couple_household",
            "lone_parent_household",
            "other_household_types",
        ],
        [
            (Region::EnglandWales, columns(1..=7)),
            // The Scottish layout has no one-family total, only three family types.
            (
                Region::Scotland,
                vec![
                    Column(1),
                    Column(2),
                    Sum(vec![3, 4, 5]),
                    Column(3),
                    Column(4),
                    Column(5),
                    Column(6),
                ],
            ),
            (Region::NorthernIreland, columns(1..=7)),
        ],
    )
}

/// KS401: dwellings, household spaces and accommodation type.
pub fn ks401() -> CensusResult<TableDef> {
    define(
        "KS401",
        &[
            "all_dwellings",
            "unshared_dwelling",
            "shared_dwelling",
            "household_spaces_with_residents",
            "household_spaces_no_residents",
        ],
        [
            (Region::EnglandWales, columns(1..=5)),
            // The Scottish layout has household spaces first and shared dwellings split by size.
            (
                Region::Scotland,
                vec![Column(1), Column(4), Sum(vec![5, 6]), Column(2), Column(3)],
            ),
            // The Northern Irish layout has no shared dwelling column.
            (
                Region::NorthernIreland,
                vec![Column(1), Unset, Unset, Column(2), Column(3)],
            ),
        ],
    )
}

/// QS104: sex.
pub fn qs104() -> CensusResult<TableDef> {
    define(
        "QS104",
        &["all_usual_residents", "males", "females"],
        [
            (Region::EnglandWales, columns(1..=3)),
            (Region::Scotland, columns(1..=3)),
            // The Northern Irish layout has no total column.
            (
                Region::NorthernIreland,
                vec![Sum(vec![1, 2]), Column(1), Column(2)],
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use csv::StringRecord;
    use rstest::rstest;

    use super::*;
    use crate::SENTINEL;

    #[test]
    fn every_table_is_valid() {
        let tables = all().unwrap();
        assert_eq!(tables.len(), TABLE_NAMES.len());
        for table in tables {
            assert!(!table.layouts().is_empty(), "{}", table.name());
        }
    }

    #[rstest]
    #[case("ks101")]
    #[case("QS104")]
    fn lookup_ignores_case(#[case] name: &str) {
        assert_eq!(table(name).unwrap().name(), name.to_ascii_uppercase());
    }

    #[test]
    fn unknown_table() {
        assert!(table("KS999").is_err());
    }

    #[test]
    fn scottish_one_family_is_derived() {
        let table = ks105().unwrap();
        let row = StringRecord::from(vec!["\"S00088956\"", "50", "10", "20", "5", "8", "7"]);
        let record = table
            .layout(Region::Scotland)
            .unwrap()
            .parse_row(table.schema(), 0, &row)
            .unwrap();
        assert_eq!(record.measures(), &[50, 10, 33, 20, 5, 8, 7]);
    }

    #[test]
    fn northern_irish_age_total_moves_first() {
        let table = ks102().unwrap();
        let fields: Vec<String> = std::iter::once("\"N00000001\"".to_string())
            .chain((1..=16).map(|i| i.to_string()))
            .chain(std::iter::once("136".to_string()))
            .collect();
        let record = table
            .layout(Region::NorthernIreland)
            .unwrap()
            .parse_row(table.schema(), 0, &StringRecord::from(fields))
            .unwrap();
        assert_eq!(record.measure(0), Some(136));
        assert_eq!(record.measure(1), Some(1));
        assert_eq!(record.measure(16), Some(16));
    }

    #[test]
    fn unpublished_measures_stay_unset() {
        let table = ks401().unwrap();
        let row = StringRecord::from(vec!["\"N00000001\"", "120", "110", "10"]);
        let record = table
            .layout(Region::NorthernIreland)
            .unwrap()
            .parse_row(table.schema(), 0, &row)
            .unwrap();
        assert_eq!(record.measures(), &[120, SENTINEL, SENTINEL, 110, 10]);
    }
}
