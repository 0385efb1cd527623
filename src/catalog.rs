//! Catalog building, deduplication and persistence.
//!
//! A catalog is the sorted, deduplicated list of `SongRecord`s for one source
//! group. It is built once by `build-catalog` and read by every setlist run.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::SourceGroup;
use crate::error::{Error, Result};
use crate::models::{SongPartIndex, SongRecord};
use crate::normalize::strip_extension;
use crate::parse::{FilenameParser, SHEET_MUSIC_EXTENSION};
use crate::progress::create_spinner;

/// Pseudo-part of combined score books, left out of per-instrument copies.
const COMBINED_PART: &str = "parts";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub songs: Vec<SongRecord>,
}

impl Catalog {
    /// Sort by short name and drop unkeyed records shadowed by a keyed one.
    ///
    /// An unkeyed record is dropped when another record with the same
    /// (short_name, part) has a key and at least as many horns.
    pub fn from_records(mut records: Vec<SongRecord>) -> Self {
        records.sort_by_cached_key(|r| r.short_name.to_lowercase());

        let mut index: SongPartIndex = FxHashMap::default();
        for (i, r) in records.iter().enumerate() {
            index
                .entry((r.short_name.clone(), r.part.clone()))
                .or_default()
                .push(i);
        }

        let max_keyed_horns: FxHashMap<&(String, String), u32> = index
            .iter()
            .filter_map(|(group, positions)| {
                positions
                    .iter()
                    .map(|&i| &records[i])
                    .filter(|r| r.key.is_some())
                    .map(|r| r.num_horns.unwrap_or(0))
                    .max()
                    .map(|horns| (group, horns))
            })
            .collect();

        let keep: Vec<bool> = records
            .iter()
            .map(|r| {
                if r.key.is_some() {
                    return true;
                }
                let group = (r.short_name.clone(), r.part.clone());
                match max_keyed_horns.get(&group) {
                    Some(&keyed) => keyed < r.num_horns.unwrap_or(0),
                    None => true,
                }
            })
            .collect();

        let songs = records
            .into_iter()
            .zip(keep)
            .filter_map(|(r, keep)| keep.then_some(r))
            .collect();
        Self { songs }
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Load a catalog file. Any failure here is fatal to the caller.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog: Catalog = serde_json::from_str(&json).map_err(|source| Error::CatalogParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded {} songs from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Write the catalog as pretty JSON, creating parent directories.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Group file paths by the first word of their part ("alto", "trumpet").
    pub fn files_by_instrument(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for song in &self.songs {
            let instrument = song
                .part
                .split(' ')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("unknown");
            if instrument == COMBINED_PART {
                continue;
            }
            groups
                .entry(instrument.to_string())
                .or_default()
                .push(song.file_path.clone());
        }
        groups
    }
}

/// Collect every sheet-music file under the group's directories.
pub fn collect_files(dirs: &[PathBuf], ignore_patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            warn!("Source directory does not exist: {}", dir.display());
            continue;
        }
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored(e.path(), ignore_patterns));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let is_sheet_music = entry
                .file_name()
                .to_str()
                .and_then(|name| strip_extension(name, SHEET_MUSIC_EXTENSION))
                .is_some();
            if entry.file_type().is_file() && is_sheet_music {
                files.push(entry.into_path());
            }
        }
    }
    files
}

fn is_ignored(path: &Path, ignore_patterns: &[String]) -> bool {
    let path = path.to_string_lossy();
    ignore_patterns.iter().any(|p| path.contains(p.as_str()))
}

/// Parse a list of files with the group's convention, in parallel.
pub fn parse_files<P: FilenameParser + Sync>(parser: &P, files: &[PathBuf]) -> Vec<SongRecord> {
    files
        .par_iter()
        .filter_map(|path| {
            let file_name = path.file_name()?.to_str()?;
            let absolute = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            Some(parser.parse(file_name, &absolute))
        })
        .collect()
}

/// Walk, parse, deduplicate and sort one source group.
pub fn scan_group(name: &str, group: &SourceGroup, ignore_patterns: &[String]) -> Catalog {
    let spinner = create_spinner(&format!("Scanning {}", name));
    let files = collect_files(&group.dirs, ignore_patterns);
    spinner.set_message(format!("Parsing {} files for {}", files.len(), name));

    let records = parse_files(&group.convention, &files);
    let unparsed = records.iter().filter(|r| !r.is_parsed()).count();
    if unparsed > 0 {
        warn!("{}: {} file names matched no naming convention", name, unparsed);
    }

    let catalog = Catalog::from_records(records);
    spinner.finish_with_message(format!("{}: {} songs", name, catalog.len()));
    info!(
        "{}: catalogued {} of {} files",
        name,
        catalog.len(),
        files.len()
    );
    catalog
}
