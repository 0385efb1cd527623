//! Setlist directory layout and writers.
//!
//! ```text
//! <setlists_dir>/<setlist name>/
//!     setlist.json
//!     foundSongs.json  foundParts.json  notFoundParts.json  summary.json
//!     <setlist name> - <part>.pdf        (merged, written by the merge step)
//!     <part>/
//!         1.00. <set name>.pdf
//!         1.01. <full name>.pdf
//!         1.02. <raw title> (NOT FOUND).pdf
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{PartSpec, SetDivider, SetlistSpec};
use crate::pdf::TextPage;
use crate::resolve::Resolution;
use crate::safety::{validate_dir_name, validate_output_dir};

pub const SETLIST_FILE: &str = "setlist.json";
pub const FOUND_SONGS_FILE: &str = "foundSongs.json";
pub const FOUND_PARTS_FILE: &str = "foundParts.json";
pub const NOT_FOUND_PARTS_FILE: &str = "notFoundParts.json";
pub const SUMMARY_FILE: &str = "summary.json";
pub const ALL_SONGS_FILE: &str = "allSongs.json";

/// Paths inside one setlist's output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetlistLayout {
    pub name: String,
    pub dir: PathBuf,
}

impl SetlistLayout {
    /// Fails unless `name` is a single plain folder name.
    pub fn new(setlists_dir: &Path, name: &str) -> Result<Self> {
        validate_dir_name(name)?;
        Ok(Self {
            name: name.to_string(),
            dir: setlists_dir.join(name),
        })
    }

    pub fn part_dir(&self, part: &str) -> PathBuf {
        self.dir.join(part)
    }

    /// Merged book for one part: "<setlist> - <part>.pdf"
    pub fn merged_file(&self, part: &str) -> PathBuf {
        self.dir.join(format!("{} - {}.pdf", self.name, part))
    }

    pub fn summary_file(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE)
    }
}

/// `setlist.json`: the setlist as configured, including its parts.
#[derive(Serialize)]
struct SetlistSnapshot<'a> {
    #[serde(flatten)]
    setlist: &'a SetlistSpec,
    parts: Vec<&'a str>,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Wipe and recreate the setlist directory with one folder per part.
///
/// Refuses to touch a directory that overlaps any score source or would take
/// one of `reserved_dirs` with it.
pub fn bootstrap_setlist_dir(
    layout: &SetlistLayout,
    setlist: &SetlistSpec,
    parts: &PartSpec,
    source_dirs: &[&Path],
    reserved_dirs: &[PathBuf],
) -> Result<()> {
    validate_output_dir(&layout.dir, source_dirs, reserved_dirs)?;

    if layout.dir.exists() {
        debug!("Removing previous output {}", layout.dir.display());
        std::fs::remove_dir_all(&layout.dir)?;
    }
    std::fs::create_dir_all(&layout.dir)?;

    let snapshot = SetlistSnapshot {
        setlist,
        parts: parts.parts().collect(),
    };
    write_json(&layout.dir.join(SETLIST_FILE), &snapshot)?;

    for part in parts.parts() {
        validate_dir_name(part)?;
        std::fs::create_dir(layout.part_dir(part))?;
    }
    info!("Prepared {} part folders in {}", parts.len(), layout.dir.display());
    Ok(())
}

/// Counts of files written by `write_resolution`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub dividers: usize,
    pub placeholders: usize,
    pub copies: usize,
}

fn write_divider(part_dir: &Path, divider: &SetDivider) -> Result<()> {
    TextPage::divider(&divider.name).write_to(&part_dir.join(divider.file_name()))
}

/// Populate every part folder: set dividers, placeholders and renamed copies.
pub fn write_resolution(layout: &SetlistLayout, resolution: &Resolution) -> Result<WriteStats> {
    let mut stats = WriteStats::default();

    for part in &resolution.parts {
        let part_dir = layout.part_dir(&part.part);
        std::fs::create_dir_all(&part_dir)?;

        for divider in &resolution.dividers {
            write_divider(&part_dir, divider)?;
            stats.dividers += 1;
        }

        for placeholder in &part.placeholders {
            let path = part_dir.join(format!("{}.pdf", placeholder.file_stem));
            TextPage::placeholder(&placeholder.text).write_to(&path)?;
            stats.placeholders += 1;
        }

        for song in &part.found {
            let dest = part_dir.join(song.output_file_name());
            std::fs::copy(&song.record.file_path, &dest)?;
            stats.copies += 1;
        }
        debug!("{}: {} files", part.part, part.found.len() + part.placeholders.len());
    }

    info!(
        "Wrote {} copies, {} placeholders, {} dividers",
        stats.copies, stats.placeholders, stats.dividers
    );
    Ok(stats)
}

/// Write `foundSongs.json`, `foundParts.json` and `notFoundParts.json`.
pub fn write_debug_dumps(layout: &SetlistLayout, resolution: &Resolution) -> Result<()> {
    write_json(&layout.dir.join(FOUND_SONGS_FILE), &resolution.found_songs_json())?;
    write_json(&layout.dir.join(FOUND_PARTS_FILE), &resolution.found_parts_json())?;
    write_json(&layout.dir.join(NOT_FOUND_PARTS_FILE), &resolution.not_found_parts_json())?;
    Ok(())
}

/// Rebuild `all_dir` as one folder per instrument holding every catalogued file.
///
/// Writes the instrument -> files index as `allSongs.json` and returns the
/// number of files copied. Files sharing a base name within one instrument
/// overwrite each other.
pub fn write_instrument_library(
    all_dir: &Path,
    by_instrument: &BTreeMap<String, Vec<String>>,
    source_dirs: &[&Path],
    reserved_dirs: &[PathBuf],
) -> Result<usize> {
    validate_output_dir(all_dir, source_dirs, reserved_dirs)?;
    if all_dir.exists() {
        std::fs::remove_dir_all(all_dir)?;
    }
    std::fs::create_dir_all(all_dir)?;
    write_json(&all_dir.join(ALL_SONGS_FILE), by_instrument)?;

    let mut copied = 0;
    for (instrument, files) in by_instrument {
        let dir = all_dir.join(instrument);
        std::fs::create_dir_all(&dir)?;
        for file in files {
            let source = Path::new(file);
            let Some(name) = source.file_name() else {
                continue;
            };
            std::fs::copy(source, dir.join(name))?;
            copied += 1;
        }
    }
    Ok(copied)
}
