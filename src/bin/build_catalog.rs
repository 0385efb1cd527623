//! Scan every configured source group and write one catalog JSON per group.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use setlist_builder::catalog::scan_group;
use setlist_builder::progress::{format_duration, init_logging, set_log_only};
use setlist_builder::SourcesConfig;

#[derive(Parser)]
#[command(name = "build-catalog")]
#[command(about = "Build song catalogs from sheet-music file names")]
struct Args {
    /// Source groups and directories
    #[arg(long, default_value = "config/sources.toml")]
    config: PathBuf,

    /// Only rebuild this group
    #[arg(long)]
    group: Option<String>,

    /// Parser threads (0 = all cores)
    #[arg(long, default_value = "0")]
    workers: usize,

    /// Hide spinners for tail-friendly output
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging("info");
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();
    let config = SourcesConfig::load(&args.config).context("Failed to load sources config")?;

    let names: Vec<String> = match &args.group {
        Some(name) => {
            config.group(name)?;
            vec![name.clone()]
        }
        None => config.groups.keys().cloned().collect(),
    };

    let mut total = 0;
    for name in &names {
        let group = config.group(name)?;
        let catalog = scan_group(name, group, &config.ignore_patterns);
        let path = config.catalog_path(name);
        catalog
            .persist(&path)
            .with_context(|| format!("Failed to write catalog {}", path.display()))?;
        info!("Wrote {} ({} songs)", path.display(), catalog.len());
        total += catalog.len();
    }

    println!("\n{:=<60}", "");
    println!("Catalogs complete!");
    println!("  Groups: {}", names.len());
    println!("  Songs: {}", total);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
