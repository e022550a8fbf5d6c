use census_error::{CensusResult, census_bail};
use census_schema::{SENTINEL, ZoneCode};

/// Running per-field totals of one group.
///
/// The first contribution seeds the totals unchanged. An unset field contributes nothing, so a
/// total stays unset only while every contribution to it was unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Accumulator {
    totals: Vec<i32>,
    records: u64,
}

impl Accumulator {
    pub(crate) fn seed(measures: &[i32]) -> Self {
        Self {
            totals: measures.to_vec(),
            records: 1,
        }
    }

    pub(crate) fn add(&mut self, key: &ZoneCode, measures: &[i32]) -> CensusResult<()> {
        if measures.len() != self.totals.len() {
            census_bail!(
                SchemaMismatch: "group {} has {} measures but a contribution has {}",
                key,
                self.totals.len(),
                measures.len()
            );
        }

        for (idx, (total, value)) in self.totals.iter_mut().zip(measures).enumerate() {
            if *value == SENTINEL {
                continue;
            }
            if *total == SENTINEL {
                *total = *value;
                continue;
            }
            *total = match total.checked_add(*value) {
                Some(sum) if sum != SENTINEL => sum,
                _ => census_bail!(
                    Overflow: "field {} of group {} overflows adding {} to {}",
                    idx,
                    key,
                    value,
                    total
                ),
            };
        }
        self.records += 1;
        Ok(())
    }

    pub(crate) fn records(&self) -> u64 {
        self.records
    }

    pub(crate) fn into_totals(self) -> Vec<i32> {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use census_error::CensusError;

    use super::*;

    fn key() -> ZoneCode {
        ZoneCode::new("E02000001").unwrap()
    }

    #[test]
    fn unset_contributes_nothing() {
        let mut acc = Accumulator::seed(&[SENTINEL, 4, SENTINEL]);
        acc.add(&key(), &[3, SENTINEL, SENTINEL]).unwrap();
        acc.add(&key(), &[2, 1, SENTINEL]).unwrap();
        assert_eq!(acc.records(), 3);
        assert_eq!(acc.into_totals(), vec![5, 5, SENTINEL]);
    }

    #[test]
    fn zero_is_observed() {
        let mut acc = Accumulator::seed(&[0]);
        acc.add(&key(), &[SENTINEL]).unwrap();
        assert_eq!(acc.into_totals(), vec![0]);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut acc = Accumulator::seed(&[i32::MAX - 1]);
        assert!(matches!(
            acc.add(&key(), &[2]).unwrap_err(),
            CensusError::Overflow(..)
        ));
    }

    #[test]
    fn sum_landing_on_unset_is_an_overflow() {
        let mut acc = Accumulator::seed(&[i32::MIN + 1]);
        assert!(matches!(
            acc.add(&key(), &[-1]).unwrap_err(),
            CensusError::Overflow(..)
        ));
    }

    #[test]
    fn width_mismatch() {
        let mut acc = Accumulator::seed(&[1, 2]);
        assert!(matches!(
            acc.add(&key(), &[1]).unwrap_err(),
            CensusError::SchemaMismatch(..)
        ));
    }
}
