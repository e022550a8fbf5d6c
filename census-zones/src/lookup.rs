use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use census_error::{CensusResult, ResultExt, census_bail, census_err};
use census_schema::ZoneCode;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

/// Column positions and dialect of an Output Area lookup table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupOptions {
    /// Zero-based column holding the Output Area code.
    pub oa_column: usize,
    /// Zero-based column holding the MSOA code.
    pub msoa_column: usize,
    /// Whether the first row is a header.
    pub has_header: bool,
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
}

impl Default for LookupOptions {
    fn default() -> Self {
        // OA11CD,LSOA11CD,LSOA11NM,MSOA11CD,MSOA11NM,LAD11CD,...
        Self {
            oa_column: 0,
            msoa_column: 3,
            has_header: true,
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl LookupOptions {
    /// Set the Output Area and MSOA column positions.
    pub fn with_columns(mut self, oa_column: usize, msoa_column: usize) -> Self {
        self.oa_column = oa_column;
        self.msoa_column = msoa_column;
        self
    }

    /// Set whether the first row is a header.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// The Output Area to MSOA mapping, with the sets of codes present on either side.
#[derive(Clone, Debug, Default)]
pub struct MsoaLookup {
    msoa_by_oa: HashMap<ZoneCode, ZoneCode>,
    oa_codes: BTreeSet<ZoneCode>,
    msoa_codes: BTreeSet<ZoneCode>,
}

impl MsoaLookup {
    /// Build a lookup from `(oa, msoa)` pairs. The first mapping of a repeated OA wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ZoneCode, ZoneCode)>) -> Self {
        let mut lookup = Self::default();
        for (oa, msoa) in pairs {
            lookup.insert(oa, msoa);
        }
        lookup
    }

    /// Parse a lookup table in the dialect described by `options`.
    pub fn from_reader<R: Read>(reader: R, options: &LookupOptions) -> CensusResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(options.has_header)
            .delimiter(options.delimiter)
            .quote(options.quote)
            .flexible(true)
            .from_reader(reader);

        let mut lookup = Self::default();
        let mut row = csv::StringRecord::new();
        while csv.read_record(&mut row)? {
            let line = row.position().map_or(0, csv::Position::line);
            let oa = lookup_field(&row, options.oa_column, line)?;
            let msoa = lookup_field(&row, options.msoa_column, line)?;
            match (oa, msoa) {
                (Some(oa), Some(msoa)) => lookup.insert(oa, msoa),
                (Some(oa), None) => {
                    log::warn!("Lookup line {line} gives no MSOA for {oa}, leaving it unmapped");
                }
                (None, _) => log::warn!("Skipping lookup line {line} without an Output Area"),
            }
        }
        Ok(lookup)
    }

    /// Parse the lookup table at `path`.
    pub fn from_path(path: impl AsRef<Path>, options: &LookupOptions) -> CensusResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| census_err!(IOError: e))
            .with_context(|| format!("opening lookup table {}", path.display()))?;
        let lookup = Self::from_reader(file, options)
            .with_context(|| format!("reading lookup table {}", path.display()))?;
        log::debug!(
            "Parsed {} Output Areas in {} MSOAs from {}",
            lookup.len(),
            lookup.msoa_codes.len(),
            path.display()
        );
        Ok(lookup)
    }

    fn insert(&mut self, oa: ZoneCode, msoa: ZoneCode) {
        match self.msoa_by_oa.entry(oa) {
            Entry::Occupied(e) => {
                if *e.get() != msoa {
                    log::warn!(
                        "Output Area {} maps to both {} and {}, keeping {}",
                        oa,
                        e.get(),
                        msoa,
                        e.get()
                    );
                }
            }
            Entry::Vacant(e) => {
                e.insert(msoa);
                self.oa_codes.insert(oa);
                self.msoa_codes.insert(msoa);
            }
        }
    }

    /// The MSOA containing `oa`, if the table lists it.
    pub fn get(&self, oa: &ZoneCode) -> Option<ZoneCode> {
        self.msoa_by_oa.get(oa).copied()
    }

    /// The MSOA containing `oa`, or [`ZoneCode::unmapped`] when the table does not list it.
    pub fn msoa_of(&self, oa: &ZoneCode) -> ZoneCode {
        self.get(oa).unwrap_or_else(ZoneCode::unmapped)
    }

    /// Every Output Area code in the table, ascending.
    pub fn oa_codes(&self) -> &BTreeSet<ZoneCode> {
        &self.oa_codes
    }

    /// Every MSOA code in the table, ascending.
    pub fn msoa_codes(&self) -> &BTreeSet<ZoneCode> {
        &self.msoa_codes
    }

    /// `(oa, msoa)` pairs in ascending Output Area order.
    pub fn pairs(&self) -> impl Iterator<Item = (ZoneCode, ZoneCode)> + '_ {
        self.oa_codes
            .iter()
            .filter_map(|oa| self.msoa_by_oa.get(oa).map(|msoa| (*oa, *msoa)))
    }

    /// The number of Output Areas mapped.
    pub fn len(&self) -> usize {
        self.msoa_by_oa.len()
    }

    /// Whether the table maps no Output Areas.
    pub fn is_empty(&self) -> bool {
        self.msoa_by_oa.is_empty()
    }
}

/// The zone code in `column`, or `None` for a blank cell.
fn lookup_field(
    row: &csv::StringRecord,
    column: usize,
    line: u64,
) -> CensusResult<Option<ZoneCode>> {
    let Some(field) = row.get(column) else {
        census_bail!(
            Parse: "line {} has {} columns, lookup column {} is missing",
            line,
            row.len(),
            column
        );
    };
    let field = field.trim();
    if field.is_empty() {
        return Ok(None);
    }
    ZoneCode::new(field)
        .map(Some)
        .map_err(|e| e.with_context(format!("line {line}")))
}

#[cfg(test)]
mod tests {
    use census_error::CensusError;

    use super::*;

    const LUT: &str = "\
OA11CD,LSOA11CD,LSOA11NM,MSOA11CD,MSOA11NM
\"E00000001\",\"E01000001\",\"City of London 001A\",\"E02000001\",\"City of London 001\"
\"E00000003\",\"E01000001\",\"City of London 001A\",\"E02000001\",\"City of London 001\"
\"W00000002\",\"W01000001\",\"Anglesey 001A\",\"W02000001\",\"Anglesey 001\"
";

    fn zone(code: &str) -> ZoneCode {
        ZoneCode::new(code).unwrap()
    }

    #[test]
    fn parses_national_layout() {
        let lookup = MsoaLookup::from_reader(LUT.as_bytes(), &LookupOptions::default()).unwrap();
        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup.get(&zone("E00000003")), Some(zone("E02000001")));
        assert_eq!(lookup.get(&zone("E00000002")), None);
        assert_eq!(lookup.msoa_of(&zone("E00000002")), ZoneCode::unmapped());
        assert_eq!(
            lookup.msoa_codes().iter().map(ZoneCode::as_str).collect::<Vec<_>>(),
            vec!["E02000001", "W02000001"]
        );
        assert_eq!(
            lookup.pairs().next(),
            Some((zone("E00000001"), zone("E02000001")))
        );
    }

    #[test]
    fn first_mapping_wins() {
        let lookup = MsoaLookup::from_pairs([
            (zone("E00000001"), zone("E02000001")),
            (zone("E00000001"), zone("E02000009")),
        ]);
        assert_eq!(lookup.msoa_of(&zone("E00000001")), zone("E02000001"));
        assert_eq!(lookup.msoa_codes().len(), 1);
    }

    #[test]
    fn custom_columns_without_header() {
        let options = LookupOptions::default()
            .with_columns(1, 0)
            .with_header(false)
            .with_delimiter(b'\t');
        let lookup = MsoaLookup::from_reader("S02000001\tS00088956\n".as_bytes(), &options).unwrap();
        assert_eq!(lookup.msoa_of(&zone("S00088956")), zone("S02000001"));
    }

    #[test]
    fn missing_column_is_a_parse_error() {
        let err = MsoaLookup::from_reader(
            "OA11CD,LSOA11CD\nE00000001,E01000001\n".as_bytes(),
            &LookupOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CensusError::Parse(..)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn blank_cells_leave_the_area_unmapped() {
        let lut = "\
OA11CD,LSOA11CD,LSOA11NM,MSOA11CD
\"E00000001\",\"E01000001\",\"a\",\"E02000001\"
\"E00000002\",\"E01000001\",\"b\",\"\"
\"\",\"E01000002\",\"c\",\"E02000002\"
\"E00000003\",\"E01000002\",\"d\",\"E02000002\"
";
        let lookup = MsoaLookup::from_reader(lut.as_bytes(), &LookupOptions::default()).unwrap();
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.msoa_of(&zone("E00000002")), ZoneCode::unmapped());
        assert_eq!(lookup.msoa_of(&zone("E00000003")), zone("E02000002"));
        assert!(!lookup.oa_codes().contains(&zone("E00000002")));
    }
}
