use std::path::{Path, PathBuf};

use census::aggregate::aggregate_to_store;
use census::store::RecordStore;
use census::zones::{LookupOptions, ZoneCache, ZoneHierarchy, ZoneLevel};
use indicatif::ProgressBar;

use crate::table::TableArgs;

#[derive(Debug, clap::Args)]
pub struct AggregateArgs {
    #[command(flatten)]
    table: TableArgs,

    /// Store of Output Area records to read.
    #[arg(long = "in", value_name = "FILE")]
    input: PathBuf,

    /// Store to write the aggregated records to. It is replaced.
    #[arg(short, long)]
    out: PathBuf,

    /// Zone level to roll up to: ward or msoa.
    #[arg(short, long)]
    level: ZoneLevel,

    /// Output Area to MSOA lookup table.
    #[arg(long, required_if_eq("level", "msoa"))]
    lut: Option<PathBuf>,

    /// Directory for the parsed lookup. Defaults to the lookup table's directory.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Lookup table column holding the Output Area code.
    #[arg(long, default_value_t = LookupOptions::default().oa_column)]
    oa_column: usize,

    /// Lookup table column holding the MSOA code.
    #[arg(long, default_value_t = LookupOptions::default().msoa_column)]
    msoa_column: usize,

    /// First record to aggregate.
    #[arg(long)]
    start: Option<u64>,

    /// One past the last record to aggregate. Defaults to the record count.
    #[arg(long)]
    end: Option<u64>,

    /// Do not draw a progress bar.
    #[arg(short, long)]
    quiet: bool,
}

pub fn exec_aggregate(args: AggregateArgs) -> anyhow::Result<()> {
    let table = args.table.resolve()?;
    let store = RecordStore::open(&args.input, table.schema().clone())?;
    let range = args.start.unwrap_or(0)..args.end.map_or_else(|| store.count(), Ok)?;

    let hierarchy = match (&args.lut, args.level) {
        (Some(lut), ZoneLevel::Msoa) => {
            let cache_dir = args.cache_dir.clone().unwrap_or_else(|| {
                lut.parent()
                    .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
            });
            ZoneHierarchy::new(
                lut,
                LookupOptions::default().with_columns(args.oa_column, args.msoa_column),
                ZoneCache::new(cache_dir),
            )
        }
        _ => ZoneHierarchy::wards_only(),
    };

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(range.end.saturating_sub(range.start))
    };
    let summary = aggregate_to_store(
        &store,
        range,
        |zone| {
            progress.inc(1);
            hierarchy.parent_of(args.level, zone)
        },
        &args.out,
    )?;
    progress.finish_and_clear();

    tracing::info!("{} by {}: {}", table.name(), args.level, summary);
    println!(
        "{} {} groups written to {}",
        summary.groups,
        args.level,
        args.out.display()
    );
    if summary.unmapped_records > 0 {
        println!(
            "{} records had no {} and were grouped as unmapped",
            summary.unmapped_records, args.level
        );
    }
    Ok(())
}
