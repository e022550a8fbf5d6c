use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use census_error::{CensusResult, ResultExt, census_bail, census_err};
use census_schema::ZoneCode;

use crate::{LookupOptions, MsoaLookup};

const MAPPING_SUFFIX: &str = "oa_msoa.csv";
const OA_CODES_SUFFIX: &str = "oa_codes.txt";
const MSOA_CODES_SUFFIX: &str = "msoa_codes.txt";

/// The side artifacts persisted for one lookup table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheArtifacts {
    /// Two column `oa,msoa` CSV, no header.
    pub mapping: PathBuf,
    /// One Output Area code per line, ascending.
    pub oa_codes: PathBuf,
    /// One MSOA code per line, ascending.
    pub msoa_codes: PathBuf,
}

impl CacheArtifacts {
    fn all(&self) -> [&Path; 3] {
        [&self.mapping, &self.oa_codes, &self.msoa_codes]
    }
}

/// Parses lookup tables once and keeps the parsed form beside them in a cache directory.
///
/// Artifacts are keyed by the lookup table's file stem and are never checked against the table
/// they came from. Call [`ZoneCache::clear`] after replacing a table.
#[derive(Clone, Debug)]
pub struct ZoneCache {
    dir: PathBuf,
}

impl ZoneCache {
    /// A cache storing its artifacts in `dir`, which is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The artifact paths for the lookup table at `lut_path`.
    pub fn artifacts(&self, lut_path: &Path) -> CensusResult<CacheArtifacts> {
        let stem = lut_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| census_err!("lookup table path {} has no file name", lut_path.display()))?;
        let artifact = |suffix: &str| self.dir.join(format!("{stem}.{suffix}"));
        Ok(CacheArtifacts {
            mapping: artifact(MAPPING_SUFFIX),
            oa_codes: artifact(OA_CODES_SUFFIX),
            msoa_codes: artifact(MSOA_CODES_SUFFIX),
        })
    }

    /// Whether a parsed mapping for `lut_path` is present.
    pub fn is_cached(&self, lut_path: &Path) -> CensusResult<bool> {
        Ok(self.artifacts(lut_path)?.mapping.exists())
    }

    /// Load the cached mapping for `lut_path`, parsing the table and persisting it first if
    /// it is not cached yet.
    pub fn load_or_build(&self, lut_path: &Path, options: &LookupOptions) -> CensusResult<MsoaLookup> {
        let artifacts = self.artifacts(lut_path)?;
        if artifacts.mapping.exists() {
            log::debug!(
                "Loading cached zone lookup {}",
                artifacts.mapping.display()
            );
            return load_mapping(&artifacts)
                .with_context(|| format!("loading {}", artifacts.mapping.display()));
        }

        log::info!(
            "Building zone lookup cache for {} in {}",
            lut_path.display(),
            self.dir.display()
        );
        let lookup = MsoaLookup::from_path(lut_path, options)?;
        self.persist(&artifacts, &lookup)?;
        Ok(lookup)
    }

    /// Remove every artifact of `lut_path`. Returns whether anything was removed.
    pub fn clear(&self, lut_path: &Path) -> CensusResult<bool> {
        let artifacts = self.artifacts(lut_path)?;
        let mut removed = false;
        for path in artifacts.all() {
            match fs::remove_file(path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(census_err!(IOError: e))
                        .with_context(|| format!("removing {}", path.display()));
                }
            }
        }
        Ok(removed)
    }

    fn persist(&self, artifacts: &CacheArtifacts, lookup: &MsoaLookup) -> CensusResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| census_err!(IOError: e))
            .with_context(|| format!("creating cache directory {}", self.dir.display()))?;

        // Code sets first: a present mapping marks the whole entry as cached.
        write_atomically(&artifacts.oa_codes, |w| write_codes(w, lookup.oa_codes()))?;
        write_atomically(&artifacts.msoa_codes, |w| {
            write_codes(w, lookup.msoa_codes())
        })?;
        write_atomically(&artifacts.mapping, |w| {
            let mut csv = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(w);
            for (oa, msoa) in lookup.pairs() {
                csv.write_record([oa.as_str(), msoa.as_str()])?;
            }
            csv.flush()?;
            Ok(())
        })
    }
}

fn write_codes<'a>(
    w: &mut impl Write,
    codes: impl IntoIterator<Item = &'a ZoneCode>,
) -> CensusResult<()> {
    for code in codes {
        writeln!(w, "{code}")?;
    }
    Ok(())
}

/// Write `path` through a temporary sibling that is renamed into place once complete.
fn write_atomically(
    path: &Path,
    f: impl FnOnce(&mut BufWriter<File>) -> CensusResult<()>,
) -> CensusResult<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let result = File::create(&temp)
        .map_err(|e| census_err!(IOError: e))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            f(&mut writer)?;
            writer.flush()?;
            Ok(())
        })
        .and_then(|()| Ok(fs::rename(&temp, path)?));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result.with_context(|| format!("writing {}", path.display()))
}

fn load_mapping(artifacts: &CacheArtifacts) -> CensusResult<MsoaLookup> {
    let options = LookupOptions::default().with_columns(0, 1).with_header(false);
    let lookup = MsoaLookup::from_path(&artifacts.mapping, &options)?;

    check_codes(&artifacts.oa_codes, lookup.oa_codes())?;
    check_codes(&artifacts.msoa_codes, lookup.msoa_codes())?;
    Ok(lookup)
}

/// Fails unless the code list at `path` holds exactly `expected`.
fn check_codes(path: &Path, expected: &BTreeSet<ZoneCode>) -> CensusResult<()> {
    let file = File::open(path)
        .map_err(|e| census_err!(IOError: e))
        .with_context(|| format!("opening {}", path.display()))?;
    let mut listed = BTreeSet::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let code = line.trim();
        if !code.is_empty() {
            listed.insert(ZoneCode::new(code)?);
        }
    }

    if listed != *expected {
        census_bail!(
            Corrupt: "{} lists {} codes that disagree with the {} in the cached mapping, clear the cache to rebuild it",
            path.display(),
            listed.len(),
            expected.len()
        );
    }
    Ok(())
}
