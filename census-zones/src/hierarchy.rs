use std::cell::OnceCell;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use census_error::{CensusError, CensusResult, census_bail, census_err};
use census_schema::{WARD_PREFIX_WIDTH, ZoneCode};

use crate::{LookupOptions, MsoaLookup, ZoneCache};

/// The Ward containing an Output Area: the first six characters of its code.
pub fn ward_of(code: &ZoneCode) -> ZoneCode {
    code.prefix(WARD_PREFIX_WIDTH)
}

/// A coarser geography Output Areas roll up into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZoneLevel {
    /// Electoral ward, named by a prefix of the Output Area code.
    Ward,
    /// Middle-layer Super Output Area, found through a lookup table.
    Msoa,
}

impl ZoneLevel {
    /// The lowercase name used on command lines and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneLevel::Ward => "ward",
            ZoneLevel::Msoa => "msoa",
        }
    }
}

impl Display for ZoneLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneLevel {
    type Err = CensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ward" => Ok(ZoneLevel::Ward),
            "msoa" => Ok(ZoneLevel::Msoa),
            _ => Err(census_err!("unknown zone level {}, expected ward or msoa", s)),
        }
    }
}

struct LookupSource {
    lut_path: PathBuf,
    options: LookupOptions,
    cache: ZoneCache,
}

/// Resolves the parent zone of an Output Area at a chosen [`ZoneLevel`].
///
/// The MSOA lookup is loaded through the [`ZoneCache`] on the first MSOA query and kept for the
/// lifetime of the hierarchy. Loading is not synchronised; one caller populates a cache.
pub struct ZoneHierarchy {
    source: Option<LookupSource>,
    lookup: OnceCell<MsoaLookup>,
}

impl ZoneHierarchy {
    /// A hierarchy that only knows Wards.
    pub fn wards_only() -> Self {
        Self {
            source: None,
            lookup: OnceCell::new(),
        }
    }

    /// A hierarchy resolving MSOAs through the lookup table at `lut_path`, cached in `cache`.
    pub fn new(lut_path: impl Into<PathBuf>, options: LookupOptions, cache: ZoneCache) -> Self {
        Self {
            source: Some(LookupSource {
                lut_path: lut_path.into(),
                options,
                cache,
            }),
            lookup: OnceCell::new(),
        }
    }

    /// A hierarchy over an already loaded lookup.
    pub fn with_lookup(lookup: MsoaLookup) -> Self {
        Self {
            source: None,
            lookup: OnceCell::from(lookup),
        }
    }

    /// The lookup table backing MSOA queries, if one was configured.
    pub fn lut_path(&self) -> Option<&Path> {
        self.source.as_ref().map(|s| s.lut_path.as_path())
    }

    /// The MSOA lookup, loading it on first use.
    pub fn msoa_lookup(&self) -> CensusResult<&MsoaLookup> {
        if let Some(lookup) = self.lookup.get() {
            return Ok(lookup);
        }
        let Some(source) = &self.source else {
            census_bail!("no MSOA lookup table configured");
        };
        let lookup = source
            .cache
            .load_or_build(&source.lut_path, &source.options)?;
        Ok(self.lookup.get_or_init(|| lookup))
    }

    /// The Ward containing `code`.
    pub fn ward_of(&self, code: &ZoneCode) -> ZoneCode {
        ward_of(code)
    }

    /// The MSOA containing `code`, or [`ZoneCode::unmapped`] when the lookup does not list it.
    pub fn msoa_of(&self, code: &ZoneCode) -> CensusResult<ZoneCode> {
        Ok(self.msoa_lookup()?.msoa_of(code))
    }

    /// The zone containing `code` at `level`.
    pub fn parent_of(&self, level: ZoneLevel, code: &ZoneCode) -> CensusResult<ZoneCode> {
        match level {
            ZoneLevel::Ward => Ok(self.ward_of(code)),
            ZoneLevel::Msoa => self.msoa_of(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn zone(code: &str) -> ZoneCode {
        ZoneCode::new(code).unwrap()
    }

    #[rstest]
    #[case("E00000001", "E00000")]
    #[case("S00088956", "S00088")]
    #[case("N00001", "N00001")]
    #[case("W0", "W0")]
    fn ward_is_the_code_prefix(#[case] oa: &str, #[case] ward: &str) {
        assert_eq!(ward_of(&zone(oa)).as_str(), ward);
    }

    #[rstest]
    #[case("ward", ZoneLevel::Ward)]
    #[case("MSOA", ZoneLevel::Msoa)]
    fn parses_levels(#[case] text: &str, #[case] level: ZoneLevel) {
        assert_eq!(text.parse::<ZoneLevel>().unwrap(), level);
        assert_eq!(level.to_string(), text.to_ascii_lowercase());
    }

    #[test]
    fn unknown_level() {
        assert!("lsoa".parse::<ZoneLevel>().is_err());
    }

    #[test]
    fn msoa_needs_a_lookup() {
        let hierarchy = ZoneHierarchy::wards_only();
        let oa = zone("E00000001");
        assert_eq!(
            hierarchy.parent_of(ZoneLevel::Ward, &oa).unwrap(),
            zone("E00000")
        );
        assert!(hierarchy.parent_of(ZoneLevel::Msoa, &oa).is_err());
    }

    #[test]
    fn misses_are_unmapped() {
        let hierarchy = ZoneHierarchy::with_lookup(MsoaLookup::from_pairs([(
            zone("E00000001"),
            zone("E02000001"),
        )]));
        assert_eq!(hierarchy.msoa_of(&zone("E00000001")).unwrap(), zone("E02000001"));
        assert_eq!(
            hierarchy.msoa_of(&zone("E00099999")).unwrap(),
            ZoneCode::unmapped()
        );
    }

    #[test]
    fn loads_lookup_once() {
        let dir = TempDir::new().unwrap();
        let lut = dir.path().join("lut.csv");
        fs::write(
            &lut,
            "OA11CD,LSOA11CD,LSOA11NM,MSOA11CD\n\"E00000001\",\"E01000001\",\"a\",\"E02000001\"\n",
        )
        .unwrap();
        let cache = ZoneCache::new(dir.path().join("cache"));
        let hierarchy = ZoneHierarchy::new(&lut, LookupOptions::default(), cache.clone());

        assert!(!cache.is_cached(&lut).unwrap());
        assert_eq!(
            hierarchy.parent_of(ZoneLevel::Msoa, &zone("E00000001")).unwrap(),
            zone("E02000001")
        );
        assert!(cache.is_cached(&lut).unwrap());

        // Clearing the cache does not affect a hierarchy that already loaded its lookup.
        cache.clear(&lut).unwrap();
        fs::remove_file(&lut).unwrap();
        assert_eq!(
            hierarchy.msoa_of(&zone("E00000001")).unwrap(),
            zone("E02000001")
        );
    }
}
