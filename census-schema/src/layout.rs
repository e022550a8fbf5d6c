//! Mapping of delimited source text onto a schema.
//!
//! The same census table is published with a different column layout in each region. A
//! [`TextLayout`] records, for one table in one region, which text column (or sum of columns)
//! holds each measure. These mappings reflect real differences between the published tables.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use census_error::{CensusError, CensusResult, census_bail, census_err};
use csv::StringRecord;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Record, SENTINEL, Schema, ZONE_CODE_WIDTH, ZoneCode};

/// The regions whose statistics offices publish their own table layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    /// England and Wales.
    EnglandWales,
    /// Scotland.
    Scotland,
    /// Northern Ireland.
    NorthernIreland,
}

impl Region {
    /// Every region, in the order national stores concatenate them.
    pub const ALL: [Region; 3] = [
        Region::EnglandWales,
        Region::Scotland,
        Region::NorthernIreland,
    ];

    /// The short lowercase name of the region.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::EnglandWales => "ew",
            Region::Scotland => "scotland",
            Region::NorthernIreland => "ni",
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = CensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ew" | "england" | "wales" | "england_wales" => Ok(Region::EnglandWales),
            "s" | "sc" | "scotland" => Ok(Region::Scotland),
            "ni" | "northern_ireland" => Ok(Region::NorthernIreland),
            other => Err(census_err!("unknown region {}", other)),
        }
    }
}

/// Where one measure comes from in a source row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnSource {
    /// The value of a single text column.
    Column(usize),
    /// The sum of several text columns, for a measure split across them.
    Sum(Vec<usize>),
    /// The region does not publish this measure; it is stored as [`SENTINEL`].
    Unset,
}

/// The column layout of one table as published by one region.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextLayout {
    zone_offset: usize,
    columns: Vec<ColumnSource>,
}

/// Characters dropped from the zone column by default: the opening quote.
pub const DEFAULT_ZONE_OFFSET: usize = 1;

impl TextLayout {
    /// A layout with the default zone offset.
    pub fn new(columns: Vec<ColumnSource>) -> Self {
        Self {
            zone_offset: DEFAULT_ZONE_OFFSET,
            columns,
        }
    }

    /// The identity layout: measure `i` is text column `i + 1`.
    pub fn sequential(nfields: usize) -> Self {
        Self::new((1..=nfields).map(ColumnSource::Column).collect())
    }

    /// Override the number of leading characters dropped from the zone column.
    pub fn with_zone_offset(mut self, zone_offset: usize) -> Self {
        self.zone_offset = zone_offset;
        self
    }

    /// The number of leading characters dropped from the zone column.
    pub fn zone_offset(&self) -> usize {
        self.zone_offset
    }

    /// The source of each measure, in schema order.
    pub fn columns(&self) -> &[ColumnSource] {
        &self.columns
    }

    /// Check that the layout provides exactly one source per field of `schema`.
    pub fn check_schema(&self, schema: &Schema) -> CensusResult<()> {
        if self.columns.len() != schema.nfields() {
            census_bail!(
                SchemaMismatch: "layout maps {} columns but {} has {} fields",
                self.columns.len(),
                schema.name(),
                schema.nfields()
            );
        }
        let zone_column = self.columns.iter().any(|c| match c {
            ColumnSource::Column(idx) => *idx == 0,
            ColumnSource::Sum(idxs) => idxs.is_empty() || idxs.contains(&0),
            ColumnSource::Unset => false,
        });
        if zone_column {
            census_bail!(
                "layout for {} reads a measure from the zone column or sums no columns",
                schema.name()
            );
        }
        Ok(())
    }

    /// Extract the zone code from the first text column.
    ///
    /// `zone_offset` leading characters are dropped and the following ten characters are
    /// kept, stopping early at a closing quote or whitespace.
    pub fn parse_zone(&self, field: &str) -> CensusResult<ZoneCode> {
        let code: String = field
            .chars()
            .skip(self.zone_offset)
            .take(ZONE_CODE_WIDTH)
            .take_while(|c| *c != '"' && !c.is_whitespace())
            .collect();
        ZoneCode::new(&code)
    }

    /// Parse one source row into a record with the given id.
    ///
    /// Missing and empty numeric fields read as zero; any other non-numeric text is an error.
    pub fn parse_row(&self, schema: &Schema, id: u64, row: &StringRecord) -> CensusResult<Record> {
        self.check_schema(schema)?;
        let zone = self
            .parse_zone(row.get(0).unwrap_or_default())
            .map_err(|e| e.with_context("reading zone code from column 0"))?;

        let measures = self
            .columns
            .iter()
            .zip(schema.fields())
            .map(|(source, field)| match source {
                ColumnSource::Column(idx) => parse_count(row, *idx, field.name()),
                ColumnSource::Sum(idxs) => idxs.iter().try_fold(0i32, |acc, idx| {
                    let value = parse_count(row, *idx, field.name())?;
                    acc.checked_add(value)
                        .filter(|sum| *sum != SENTINEL)
                        .ok_or_else(|| {
                            census_err!(
                                Overflow: "sum of columns [{}] for {} overflows",
                                idxs.iter().format(", "),
                                field.name()
                            )
                        })
                }),
                ColumnSource::Unset => Ok(SENTINEL),
            })
            .collect::<CensusResult<Vec<_>>>()?;

        Ok(Record::new(id, zone, measures))
    }
}

fn parse_count(row: &StringRecord, idx: usize, field: &str) -> CensusResult<i32> {
    let text = row.get(idx).unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(0);
    }
    let value = text.parse::<i32>().map_err(|e| {
        census_err!(
            Parse: "column {} ({}) holds '{}', not a count: {}",
            idx,
            field,
            text,
            e
        )
    })?;
    if value == SENTINEL {
        census_bail!(Parse: "column {} ({}) holds the reserved unset value", idx, field);
    }
    Ok(value)
}
