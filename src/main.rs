use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use setlist_builder::merge::{run_merges, ExternalMerger, MergeJob};
use setlist_builder::output::{bootstrap_setlist_dir, write_debug_dumps, write_resolution, SetlistLayout};
use setlist_builder::progress::{create_progress_bar, format_duration, log_progress, set_log_only};
use setlist_builder::{classify_ensemble, Catalog, Resolution, Resolver, RunSummary, SetlistConfig, SourcesConfig};

#[derive(Parser)]
#[command(name = "setlist")]
#[command(about = "Resolve a setlist into per-part folders and merged part books")]
struct Args {
    /// Setlist definition (TOML)
    setlist: PathBuf,

    /// Source groups and directories
    #[arg(long, default_value = "config/sources.toml")]
    sources: PathBuf,

    /// Hide progress bars and log periodic progress instead
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setlist_builder::progress::init_logging("info");
    set_log_only(args.log_only);

    let start = Instant::now();

    let sources = SourcesConfig::load(&args.sources).context("Failed to load sources config")?;
    let config = SetlistConfig::load(&args.setlist).context("Failed to load setlist")?;
    let setlist = &config.setlist;
    let parts = config.part_spec();
    let options = &setlist.options;
    info!(
        "Setlist '{}': {} songs in {} sets, {} parts",
        setlist.name,
        setlist.song_count(),
        setlist.sets.len(),
        parts.len()
    );

    let group = sources.group(&setlist.source)?;
    let catalog = Catalog::load(&sources.catalog_path(&setlist.source))
        .with_context(|| format!("No source exists for: {}", setlist.source))?;
    info!("Loaded {} catalog entries for '{}'", catalog.len(), setlist.source);

    let versions = classify_ensemble(&config.parts);
    info!(
        "Ensemble versions: sax={} trumpet={} trombone={} rhythm={}",
        versions.sax, versions.trumpet, versions.trombone, versions.rhythm
    );

    let layout = SetlistLayout::new(&sources.setlists_dir, &setlist.name)?;
    let resolve_steps = if options.only_merge { 0 } else { parts.slot_count() };
    let progress = create_progress_bar((resolve_steps + parts.len()) as u64, "Resolving");

    let resolution = if options.only_merge {
        if !layout.dir.is_dir() {
            bail!("Nothing to merge: {} does not exist", layout.dir.display());
        }
        info!("Merge only: reusing {}", layout.dir.display());
        Resolution::default()
    } else {
        let resolver = Resolver::new(&catalog, versions, options.clone())
            .strict(&setlist.source, group.strict)
            .trumpet_swap(group.trumpet_swap);
        let resolution = resolver
            .resolve(setlist, &parts, &progress)
            .context("Setlist resolution aborted")?;

        bootstrap_setlist_dir(&layout, setlist, &parts, &sources.source_dirs(), &sources.reserved_dirs())?;
        write_resolution(&layout, &resolution).context("Failed to write part folders")?;
        write_debug_dumps(&layout, &resolution).context("Failed to write debug dumps")?;
        resolution
    };

    progress.set_message("Merging parts");
    let merger = ExternalMerger::new(&sources.merge)?;
    let jobs: Vec<MergeJob> = parts.parts().map(|p| MergeJob::for_part(&layout, p)).collect();
    let total = jobs.len() as u64;
    let mut done = 0u64;
    let report = run_merges(&merger, &jobs, |outcome| {
        done += 1;
        progress.inc(1);
        progress.set_message(outcome.part.clone());
        log_progress("merge", done, total, 1);
    });
    progress.finish_with_message("Done!");
    if !report.all_merged() {
        warn!("{} of {} merges failed", report.failed.len(), report.total());
    }

    let summary = RunSummary::new(&setlist.name, &resolution, &report, start.elapsed());
    summary.log();
    summary
        .write_to_file(&layout.summary_file())
        .context("Failed to write summary")?;

    info!("Finished in {}", format_duration(start.elapsed()));
    Ok(())
}
