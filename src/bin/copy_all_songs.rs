//! Copy every catalogued file into `<setlists_dir>/<all_dir>/<instrument>/`.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

use setlist_builder::output::write_instrument_library;
use setlist_builder::progress::{create_spinner, init_logging, set_log_only};
use setlist_builder::{Catalog, SourcesConfig};

#[derive(Parser)]
#[command(name = "copy-all-songs")]
#[command(about = "Gather every catalogued score into one folder per instrument")]
struct Args {
    /// Source group to copy; all groups when omitted
    group: Option<String>,

    #[arg(long, default_value = "config/sources.toml")]
    config: PathBuf,

    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging("info");
    set_log_only(args.log_only);

    let config = SourcesConfig::load(&args.config).context("Failed to load sources config")?;
    let names: Vec<String> = match &args.group {
        Some(name) => vec![name.clone()],
        None => config.groups.keys().cloned().collect(),
    };

    let mut by_instrument: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in &names {
        let catalog = Catalog::load(&config.catalog_path(name))
            .with_context(|| format!("No source exists for: {}", name))?;
        for (instrument, files) in catalog.files_by_instrument() {
            by_instrument.entry(instrument).or_default().extend(files);
        }
    }

    let all_dir = config.all_songs_dir();
    let reserved: Vec<PathBuf> = config.reserved_dirs().into_iter().filter(|d| *d != all_dir).collect();
    let spinner = create_spinner(&format!("Copying into {}", all_dir.display()));
    let copied = write_instrument_library(&all_dir, &by_instrument, &config.source_dirs(), &reserved)
        .with_context(|| format!("Failed to populate {}", all_dir.display()))?;
    spinner.finish_and_clear();

    info!("{} instruments", by_instrument.len());
    println!("Copied {} files to {}.", copied, all_dir.display());
    Ok(())
}
