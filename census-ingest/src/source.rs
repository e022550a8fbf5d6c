use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use census_error::{CensusError, census_err};
use census_schema::Region;

/// Dialect of a source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first row is a header.
    pub has_header: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }
}

/// One source file and the region whose layout it follows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestSource {
    /// Path of the delimited text file.
    pub path: PathBuf,
    /// Region that published the file.
    pub region: Region,
}

impl IngestSource {
    /// A source file published by `region`.
    pub fn new(path: impl Into<PathBuf>, region: Region) -> Self {
        Self {
            path: path.into(),
            region,
        }
    }

    /// Path of the delimited text file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for IngestSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.region)
    }
}

/// Parses `PATH:REGION`, splitting at the last colon.
impl FromStr for IngestSource {
    type Err = CensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, region) = s
            .rsplit_once(':')
            .ok_or_else(|| census_err!("source {} is not of the form PATH:REGION", s))?;
        if path.is_empty() {
            return Err(census_err!("source {} has an empty path", s));
        }
        Ok(Self::new(path, region.parse()?))
    }
}

/// What one source contributed to a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceReport {
    /// The source read.
    pub source: IngestSource,
    /// Id of the first record appended from the source.
    pub first_id: u64,
    /// Number of records appended from the source.
    pub rows: u64,
}

/// The outcome of ingesting a sequence of sources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// One entry per source, in ingestion order.
    pub sources: Vec<SourceReport>,
    /// Records appended across every source.
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_and_region() {
        let source: IngestSource = "data/KS101EW.csv:ew".parse().unwrap();
        assert_eq!(source, IngestSource::new("data/KS101EW.csv", Region::EnglandWales));
        assert_eq!(source.to_string(), "data/KS101EW.csv:ew");

        let source: IngestSource = "C:/census/KS101SC.csv:scotland".parse().unwrap();
        assert_eq!(source.path(), Path::new("C:/census/KS101SC.csv"));
        assert_eq!(source.region, Region::Scotland);
    }

    #[test]
    fn rejects_malformed_sources() {
        assert!("KS101EW.csv".parse::<IngestSource>().is_err());
        assert!(":ni".parse::<IngestSource>().is_err());
        assert!("KS101EW.csv:mars".parse::<IngestSource>().is_err());
    }
}
