use std::fs::File;
use std::io::{Read, Write};

use census_error::{CensusResult, ResultExt, census_bail, census_err};
use census_schema::{Region, TableDef};
use census_store::RecordStoreWriter;

use crate::{IngestOptions, IngestReport, IngestSource, SourceReport};

/// Appends the rows of census source files to a record store.
pub struct Ingester<'a, W: Write> {
    writer: RecordStoreWriter<W>,
    table: &'a TableDef,
    options: IngestOptions,
}

impl<'a, W: Write> Ingester<'a, W> {
    /// An ingester parsing `table` sources into `writer`.
    ///
    /// Fails if `writer` encodes a different schema than `table`.
    pub fn new(writer: RecordStoreWriter<W>, table: &'a TableDef) -> CensusResult<Self> {
        if writer.schema().as_ref() != table.schema() {
            census_bail!(
                SchemaMismatch: "store schema {} does not match table {}",
                writer.schema(),
                table.schema()
            );
        }
        Ok(Self {
            writer,
            table,
            options: IngestOptions::default(),
        })
    }

    /// Use `options` for every following source.
    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }

    /// The id the next ingested row will get.
    pub fn position(&self) -> u64 {
        self.writer.position()
    }

    /// Ingest one source file, returning the number of rows appended.
    pub fn ingest(&mut self, source: &IngestSource) -> CensusResult<u64> {
        let file = File::open(source.path())
            .map_err(|e| census_err!(IOError: e))
            .with_context(|| format!("opening {}", source.path().display()))?;
        let first_id = self.position();
        let rows = self
            .ingest_reader(file, source.region)
            .with_context(|| format!("ingesting {}", source))?;
        log::info!(
            "Ingested {} {} rows from {} as ids [{}, {})",
            rows,
            self.table.name(),
            source,
            first_id,
            first_id + rows
        );
        Ok(rows)
    }

    /// Ingest delimited text in the layout this table uses for `region`.
    ///
    /// Rows are appended as they are read. On error the rows before the failing one stay in
    /// the store.
    pub fn ingest_reader<R: Read>(&mut self, reader: R, region: Region) -> CensusResult<u64> {
        let table = self.table;
        let layout = table.layout(region)?;
        let schema = table.schema();

        // Zone codes keep their quotes; the layout's zone offset skips them.
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(self.options.has_header)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let start = self.position();
        let mut row = csv::StringRecord::new();
        while csv.read_record(&mut row)? {
            let line = row.position().map_or(0, csv::Position::line);
            let record = layout
                .parse_row(schema, self.position(), &row)
                .with_context(|| format!("line {line}"))?;
            self.writer.append(&record)?;
        }
        Ok(self.position() - start)
    }

    /// Ingest `sources` in order, continuing one id sequence across them.
    pub fn ingest_all<'s>(
        &mut self,
        sources: impl IntoIterator<Item = &'s IngestSource>,
    ) -> CensusResult<IngestReport> {
        let mut report = IngestReport::default();
        for source in sources {
            let first_id = self.position();
            let rows = self.ingest(source)?;
            report.total += rows;
            report.sources.push(SourceReport {
                source: source.clone(),
                first_id,
                rows,
            });
        }
        Ok(report)
    }

    /// Flush the store, returning its record count.
    pub fn finish(self) -> CensusResult<u64> {
        self.writer.finish()
    }

    /// The writer rows were appended to.
    pub fn into_writer(self) -> RecordStoreWriter<W> {
        self.writer
    }
}
