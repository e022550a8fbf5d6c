use census_error::{CensusResult, census_bail};

use crate::{Schema, ZoneCode};

/// The measure value meaning "not yet populated".
///
/// Zero is a legitimate observed count, so the unset marker is the one value no census count
/// can take.
pub const SENTINEL: i32 = i32::MIN;

/// One row of a census table: a zone and its measures.
///
/// The `id` is informational. A record's address inside a store is its position, and writers
/// overwrite the id with that position; a record read back from a file written by another tool
/// may carry an id that differs from where it was found.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Record {
    id: u64,
    zone: ZoneCode,
    measures: Vec<i32>,
}

impl Record {
    /// Create a record from its parts.
    pub fn new(id: u64, zone: ZoneCode, measures: Vec<i32>) -> Self {
        Self { id, zone, measures }
    }

    /// A record of `schema` whose measures are all [`SENTINEL`].
    pub fn unset(schema: &Schema, id: u64, zone: ZoneCode) -> Self {
        Self::new(id, zone, vec![SENTINEL; schema.nfields()])
    }

    /// The informational record id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The zone the measures describe.
    pub fn zone(&self) -> &ZoneCode {
        &self.zone
    }

    /// The raw measures, including any [`SENTINEL`] values.
    pub fn measures(&self) -> &[i32] {
        &self.measures
    }

    /// Mutable access to the raw measures.
    pub fn measures_mut(&mut self) -> &mut [i32] {
        &mut self.measures
    }

    /// The measure at `idx`, or `None` if it is out of range or unset.
    pub fn measure(&self, idx: usize) -> Option<i32> {
        self.measures.get(idx).copied().filter(|v| *v != SENTINEL)
    }

    /// Whether the measure at `idx` has been populated.
    pub fn is_set(&self, idx: usize) -> bool {
        self.measure(idx).is_some()
    }

    /// Whether every measure is [`SENTINEL`].
    pub fn is_unset(&self) -> bool {
        self.measures.iter().all(|v| *v == SENTINEL)
    }

    /// Replace the informational id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Replace the zone code.
    pub fn with_zone(mut self, zone: ZoneCode) -> Self {
        self.zone = zone;
        self
    }

    /// Check that this record carries exactly one value per field of `schema`.
    pub fn check_schema(&self, schema: &Schema) -> CensusResult<()> {
        if self.measures.len() != schema.nfields() {
            census_bail!(
                SchemaMismatch: "record for zone {} has {} measures but {} expects {}",
                self.zone,
                self.measures.len(),
                schema.name(),
                schema.nfields()
            );
        }
        Ok(())
    }

    /// Decompose the record into its parts.
    pub fn into_parts(self) -> (u64, ZoneCode, Vec<i32>) {
        (self.id, self.zone, self.measures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_is_distinct_from_zero() {
        let schema = Schema::from_names("QS104", &["all", "males", "females"]).unwrap();
        let zone = ZoneCode::new("E00000001").unwrap();
        let unset = Record::unset(&schema, 0, zone);
        let zeros = Record::new(0, zone, vec![0, 0, 0]);

        assert!(unset.is_unset());
        assert!(!zeros.is_unset());
        assert_ne!(unset, zeros);
        assert_eq!(unset.measure(0), None);
        assert_eq!(zeros.measure(0), Some(0));
        assert!(!unset.is_set(2));
    }

    #[test]
    fn schema_check_counts_measures() {
        let schema = Schema::from_names("QS104", &["all", "males", "females"]).unwrap();
        let zone = ZoneCode::new("E00000001").unwrap();
        assert!(Record::new(0, zone, vec![1, 2, 3]).check_schema(&schema).is_ok());
        assert!(Record::new(0, zone, vec![1, 2]).check_schema(&schema).is_err());
    }
}
