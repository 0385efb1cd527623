//! Core data models for catalog building and setlist resolution.
//!
//! This module contains the struct definitions shared by the catalog builder,
//! the resolver and the output writer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// Requested short name -> every catalog record for that song, any part.
pub type FoundSongs = BTreeMap<String, Vec<SongRecord>>;

/// Index from (short_name, part) to positions in a record slice.
pub type SongPartIndex = FxHashMap<(String, String), Vec<usize>>;

// ============================================================================
// Catalog Models
// ============================================================================

/// One sheet-music file, described by what its filename says about it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    /// Canonical lower-cased title, empty when the name did not parse
    pub short_name: String,
    /// File name without extension, keeps original case
    pub full_name: String,
    /// Lower-cased instrument label ("trumpet", "alto", "bass")
    pub part: String,
    /// Chair within the part; 0 and 1 both mean lead/unnumbered
    #[serde(default)]
    pub part_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_horns: Option<u32>,
    pub file_path: String,
}

impl SongRecord {
    /// Empty record for a file whose name matched no convention.
    pub fn unparsed(full_name: &str, file_path: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            file_path: file_path.to_string(),
            ..Self::default()
        }
    }

    pub fn is_lead_chair(&self) -> bool {
        self.part_number <= 1
    }

    /// Key for comparison purposes; absent keys compare as "".
    pub fn key_or_empty(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    pub fn is_parsed(&self) -> bool {
        !self.short_name.is_empty() && !self.part.is_empty()
    }
}

/// A catalog record chosen for a part slot, with the name it is copied under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSong {
    #[serde(flatten)]
    pub record: SongRecord,
    /// "<set>.<nn>. <fullName>"
    pub custom_name: String,
    /// "<set>.<nn>", shared by every part's copy of the same slot
    #[serde(skip)]
    pub slot: String,
}

impl SelectedSong {
    pub fn new(record: SongRecord, slot: &str) -> Self {
        let custom_name = format!("{}. {}", slot, record.full_name);
        Self {
            record,
            custom_name,
            slot: slot.to_string(),
        }
    }

    pub fn output_file_name(&self) -> String {
        format!("{}.pdf", self.custom_name)
    }
}

// ============================================================================
// Setlist Models
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetlistOptions {
    /// Skip resolution and copying; only re-merge existing part folders
    #[serde(default)]
    pub only_merge: bool,
    /// Accept any key when matching songs
    #[serde(default)]
    pub all_keys: bool,
    /// Preferred horn-section size, 0 = no preference
    #[serde(default)]
    pub num_horns: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSpec {
    pub name: String,
    /// Raw titles: optionally 'quoted' for exact match, optionally "Title - Key"
    #[serde(default)]
    pub songs: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetlistSpec {
    pub name: String,
    /// Name of the source group whose catalog is searched
    pub source: String,
    #[serde(default)]
    pub options: SetlistOptions,
    #[serde(default)]
    pub sets: Vec<SetSpec>,
}

impl SetlistSpec {
    pub fn song_count(&self) -> usize {
        self.sets.iter().map(|s| s.songs.len()).sum()
    }
}

/// A part identifier with the titles expected for it.
#[derive(Clone, Debug, PartialEq, Eq)]
struct PartEntry {
    part: String,
    songs: Vec<String>,
}

/// Ordered part identifier -> expected song titles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartSpec {
    entries: Vec<PartEntry>,
}

impl PartSpec {
    /// Every configured part plays every song in the setlist.
    pub fn from_setlist(parts: &[String], setlist: &SetlistSpec) -> Self {
        let songs: Vec<String> = setlist
            .sets
            .iter()
            .flat_map(|set| set.songs.iter().cloned())
            .collect();
        let entries = parts
            .iter()
            .map(|part| PartEntry {
                part: part.clone(),
                songs: songs.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.part.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total (part, song) slots, used to size progress bars.
    pub fn slot_count(&self) -> usize {
        self.entries.iter().map(|e| e.songs.len()).sum()
    }
}

// ============================================================================
// Resolution Outputs
// ============================================================================

/// Stand-in document for a song that was not in the catalog at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    /// File stem: "<set>.<nn>. <raw title> (NOT FOUND)"
    pub file_stem: String,
    pub text: String,
}

/// Divider page opening a set in every part folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetDivider {
    pub set_number: usize,
    pub name: String,
}

impl SetDivider {
    pub fn file_name(&self) -> String {
        format!("{}.00. {}.pdf", self.set_number, self.name)
    }
}

/// Everything resolved for one part identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartResolution {
    pub part: String,
    pub found: Vec<SelectedSong>,
    pub not_found: Vec<String>,
    pub placeholders: Vec<Placeholder>,
}

impl PartResolution {
    pub fn new(part: &str) -> Self {
        Self {
            part: part.to_string(),
            ..Self::default()
        }
    }
}
