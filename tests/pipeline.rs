//! Catalog scan through merge, against a scratch score library.

use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use setlist_builder::catalog::scan_group;
use setlist_builder::merge::{run_merges, MergeJob, Merger};
use setlist_builder::output::{
    bootstrap_setlist_dir, write_debug_dumps, write_resolution, SetlistLayout, NOT_FOUND_PARTS_FILE,
};
use setlist_builder::{classify_ensemble, Catalog, Error, Resolver, RunSummary, SetlistConfig, SourcesConfig};

/// Writes the sorted part folder listing as the "merged" book.
struct ListingMerger;

impl Merger for ListingMerger {
    fn merge(&self, job: &MergeJob) -> setlist_builder::Result<()> {
        let mut names: Vec<String> = std::fs::read_dir(&job.source_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        std::fs::write(&job.merged_file, names.join("\n"))?;
        Ok(())
    }
}

fn write_scores(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), format!("%PDF {}", name)).unwrap();
    }
}

fn setup(strict: bool) -> (TempDir, PathBuf, PathBuf) {
    let root = TempDir::new().unwrap();
    write_scores(
        &root.path().join("scores"),
        &["Alpha - Trumpet 1.pdf", "Alpha - Trumpet 2.pdf", "Alpha - Bass.pdf", "Bravo - Bass.pdf"],
    );

    let sources = root.path().join("sources.toml");
    std::fs::write(
        &sources,
        format!(
            "[groups.mammoth]\nconvention = \"a\"\ndirs = [\"scores\"]\nstrict = {}\n",
            strict
        ),
    )
    .unwrap();

    let setlist = root.path().join("setlist.toml");
    std::fs::write(
        &setlist,
        r#"
        name = "Gig"
        source = "mammoth"
        parts = ["trumpet 1", "trombone", "bass"]

        [[sets]]
        name = "Set 1"
        songs = ["Alpha", "Ghost"]

        [[sets]]
        name = "Set 2"
        songs = ["Bravo"]
        "#,
    )
    .unwrap();

    (root, sources, setlist)
}

fn build_catalog(sources: &SourcesConfig) -> Catalog {
    let group = sources.group("mammoth").unwrap();
    let catalog = scan_group("mammoth", group, &sources.ignore_patterns);
    let path = sources.catalog_path("mammoth");
    catalog.persist(&path).unwrap();
    Catalog::load(&path).unwrap()
}

#[test]
fn test_full_pipeline() {
    let (_root, sources_path, setlist_path) = setup(false);
    let sources = SourcesConfig::load(&sources_path).unwrap();
    let config = SetlistConfig::load(&setlist_path).unwrap();
    let catalog = build_catalog(&sources);
    assert_eq!(catalog.len(), 4);

    let setlist = &config.setlist;
    let parts = config.part_spec();
    let group = sources.group(&setlist.source).unwrap();
    let resolver = Resolver::new(&catalog, classify_ensemble(&config.parts), setlist.options.clone())
        .strict(&setlist.source, group.strict)
        .trumpet_swap(group.trumpet_swap);
    let resolution = resolver.resolve(setlist, &parts, &ProgressBar::hidden()).unwrap();

    assert_eq!(resolution.total_found(), 3);
    assert_eq!(resolution.not_found("trombone"), ["Alpha", "Ghost", "Bravo"]);
    assert_eq!(resolution.not_found("trumpet 1"), ["Ghost", "Bravo"]);
    assert_eq!(resolution.not_found("bass"), ["Ghost"]);

    let layout = SetlistLayout::new(&sources.setlists_dir, &setlist.name).unwrap();
    bootstrap_setlist_dir(&layout, setlist, &parts, &sources.source_dirs(), &sources.reserved_dirs()).unwrap();
    write_resolution(&layout, &resolution).unwrap();
    write_debug_dumps(&layout, &resolution).unwrap();

    let jobs: Vec<MergeJob> = parts.parts().map(|p| MergeJob::for_part(&layout, p)).collect();
    let mut completions = 0;
    let report = run_merges(&ListingMerger, &jobs, |_| completions += 1);
    assert_eq!(completions, 3);
    assert!(report.all_merged());

    let bass_book = std::fs::read_to_string(layout.merged_file("bass")).unwrap();
    assert_eq!(
        bass_book.lines().collect::<Vec<_>>(),
        vec![
            "1.00. Set 1.pdf",
            "1.01. Alpha - Bass.pdf",
            "1.02. Ghost (NOT FOUND).pdf",
            "2.00. Set 2.pdf",
            "2.01. Bravo - Bass.pdf",
        ]
    );

    let trombone_book = std::fs::read_to_string(layout.merged_file("trombone")).unwrap();
    assert_eq!(
        trombone_book.lines().collect::<Vec<_>>(),
        vec!["1.00. Set 1.pdf", "1.02. Ghost (NOT FOUND).pdf", "2.00. Set 2.pdf"]
    );

    let copied = std::fs::read_to_string(layout.part_dir("trumpet 1").join("1.01. Alpha - Trumpet 1.pdf")).unwrap();
    assert_eq!(copied, "%PDF Alpha - Trumpet 1.pdf");

    let not_found: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(layout.dir.join(NOT_FOUND_PARTS_FILE)).unwrap()).unwrap();
    assert_eq!(not_found["trombone"].as_array().unwrap().len(), 3);

    let summary = RunSummary::new(&setlist.name, &resolution, &report, std::time::Duration::ZERO);
    assert_eq!(summary.total_parts_found, 3);
    assert_eq!(summary.total_not_found, 6);
    summary.write_to_file(&layout.summary_file()).unwrap();
    assert!(layout.summary_file().exists());
}

#[test]
fn test_strict_group_aborts_on_missing_song() {
    let (_root, sources_path, setlist_path) = setup(true);
    let sources = SourcesConfig::load(&sources_path).unwrap();
    let config = SetlistConfig::load(&setlist_path).unwrap();
    let catalog = build_catalog(&sources);

    let group = sources.group("mammoth").unwrap();
    let resolver = Resolver::new(&catalog, classify_ensemble(&config.parts), config.setlist.options.clone())
        .strict("mammoth", group.strict);
    let err = resolver
        .resolve(&config.setlist, &config.part_spec(), &ProgressBar::hidden())
        .unwrap_err();
    assert!(matches!(err, Error::SongNotFound { ref title, .. } if title == "Ghost"));

    // Nothing was written before the failure
    let layout = SetlistLayout::new(&sources.setlists_dir, &config.setlist.name).unwrap();
    assert!(!layout.dir.exists());
}

#[test]
fn test_missing_catalog_is_fatal() {
    let (_root, sources_path, _) = setup(false);
    let sources = SourcesConfig::load(&sources_path).unwrap();
    let err = Catalog::load(&sources.catalog_path("mammoth")).unwrap_err();
    assert!(matches!(err, Error::CatalogRead { .. }));
}
