use std::path::PathBuf;

use census::ingest::{IngestOptions, IngestSource, Ingester};
use census::store::RecordStoreWriter;

use crate::table::TableArgs;

#[derive(Debug, clap::Args)]
pub struct IngestArgs {
    #[command(flatten)]
    table: TableArgs,

    /// Store to write.
    #[arg(short, long)]
    out: PathBuf,

    /// Continue an existing store instead of replacing it.
    #[arg(long)]
    append: bool,

    /// Field delimiter of the source files.
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Source files as PATH:REGION, where REGION is ew, scotland or ni. Ids continue from one
    /// file to the next.
    #[arg(required = true, value_name = "PATH:REGION")]
    sources: Vec<IngestSource>,
}

pub fn exec_ingest(args: IngestArgs) -> anyhow::Result<()> {
    let table = args.table.resolve()?;
    let delimiter = u8::try_from(args.delimiter)
        .map_err(|_| anyhow::anyhow!("delimiter {} is not a single byte", args.delimiter))?;

    let writer = if args.append {
        RecordStoreWriter::open_append(&args.out, table.schema().clone())?
    } else {
        RecordStoreWriter::create(&args.out, table.schema().clone())?
    };
    let mut ingester = Ingester::new(writer, &table)?.with_options(IngestOptions {
        delimiter,
        ..IngestOptions::default()
    });

    let report = ingester.ingest_all(&args.sources)?;
    let count = ingester.finish()?;

    for source in &report.sources {
        println!(
            "{}\t{} rows\tids {}..{}",
            source.source,
            source.rows,
            source.first_id,
            source.first_id + source.rows
        );
    }
    println!(
        "{}: {} rows ingested, {} records in {}",
        table.name(),
        report.total,
        count,
        args.out.display()
    );
    Ok(())
}
