//! Song and part resolution.
//!
//! Turns the titles typed into a setlist and the configured part identifiers
//! into a concrete list of catalog files per part. Resolution is layered:
//!
//! 1. Song lookup by title and key, with a fuzzy fallback that ignores the key
//! 2. Part filtering by instrument label
//! 3. Chair and horn-count selection
//! 4. Aux parts drop the drum book when both exist
//! 5. Two-trumpet bands swap trumpet 1 and 2 on regular tunes
//!
//! Gaps are collected per part instead of failing the run, except for a
//! missing song in a strict source group.

use indicatif::ProgressBar;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::ensemble::{is_cover_tune, EnsembleVersions};
use crate::error::{Error, Result};
use crate::models::{
    FoundSongs, PartResolution, PartSpec, Placeholder, SelectedSong, SetDivider, SetlistOptions,
    SetlistSpec, SongRecord,
};
use crate::normalize::{normalize_key, normalize_text, SEGMENT_DELIMITER};
use crate::parse::split_chair;
use crate::progress::log_progress;
use crate::suggest::suggest_titles;

/// Starting value for the closest-horn-count search; any real remainder beats it.
pub const CLOSEST_HORNS_SENTINEL: u32 = 999;

/// Part identifiers swapped for two-trumpet bands.
pub const TRUMPET_LEAD: &str = "trumpet 1";
pub const TRUMPET_SECOND: &str = "trumpet 2";

const KEYS_PARTS: [&str; 4] = ["piano", "organ", "synth", "keys"];
const AUX_PARTS: [&str; 2] = ["drums", "aux"];
const DRUM_KIT: &str = "drums";

/// Slots between "[resolve]" progress lines in log-only mode.
const RESOLVE_LOG_INTERVAL: u64 = 100;

// ============================================================================
// Requests
// ============================================================================

/// A title as typed into a setlist: `Title`, `'Title'` or `Title - Key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongRequest {
    pub raw: String,
    /// Title with quotes and key suffix removed, case preserved
    pub short_name: String,
    /// Normalized key, empty when none was given
    pub key: String,
    /// Title was wrapped in single quotes
    pub exact: bool,
}

impl SongRequest {
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw.split(SEGMENT_DELIMITER).map(str::trim);
        let title = segments.next().unwrap_or("");
        let key = segments.next().and_then(normalize_key).unwrap_or_default();

        let quoted = title.len() >= 2 && title.starts_with('\'') && title.ends_with('\'');
        let short_name = if quoted { &title[1..title.len() - 1] } else { title };

        Self {
            raw: raw.to_string(),
            short_name: short_name.trim().to_string(),
            key,
            exact: quoted,
        }
    }
}

/// A configured part identifier such as "trumpet 1" or "aux".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartId {
    pub raw: String,
    /// Instrument label, lower-cased
    pub name: String,
    /// Requested chair, 0 when unspecified
    pub chair: u32,
}

impl PartId {
    pub fn parse(raw: &str) -> Self {
        let (name, chair) = split_chair(&normalize_text(raw));
        Self {
            raw: raw.to_string(),
            name,
            chair,
        }
    }

    pub fn is_aux(&self) -> bool {
        self.name.contains("aux")
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// The outcome of resolving a setlist, one entry per configured part.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub found_songs: FoundSongs,
    pub dividers: Vec<SetDivider>,
    pub parts: Vec<PartResolution>,
}

impl Resolution {
    pub fn part(&self, part: &str) -> Option<&PartResolution> {
        self.parts.iter().find(|p| p.part == part)
    }

    pub fn found(&self, part: &str) -> &[SelectedSong] {
        self.part(part).map(|p| p.found.as_slice()).unwrap_or(&[])
    }

    pub fn not_found(&self, part: &str) -> &[String] {
        self.part(part).map(|p| p.not_found.as_slice()).unwrap_or(&[])
    }

    pub fn total_found(&self) -> usize {
        self.parts.iter().map(|p| p.found.len()).sum()
    }

    pub fn total_not_found(&self) -> usize {
        self.parts.iter().map(|p| p.not_found.len()).sum()
    }

    /// Swap trumpet 1 and trumpet 2 selections slot by slot.
    ///
    /// Cover-band arrangements are written for the exact section and stay put.
    pub fn swap_trumpet_parts(&mut self) {
        let lead = self.parts.iter().position(|p| normalize_text(&p.part) == TRUMPET_LEAD);
        let second = self.parts.iter().position(|p| normalize_text(&p.part) == TRUMPET_SECOND);
        let (Some(lead), Some(second)) = (lead, second) else {
            return;
        };

        let mut lead_songs = std::mem::take(&mut self.parts[lead].found);
        let mut second_songs = std::mem::take(&mut self.parts[second].found);
        let mut swapped = vec![false; second_songs.len()];

        for song in lead_songs.iter_mut() {
            if is_cover_tune(&song.record.full_name) {
                continue;
            }
            let partner = second_songs.iter().enumerate().position(|(i, other)| {
                !swapped[i] && other.slot == song.slot && other.record.short_name == song.record.short_name
            });
            if let Some(i) = partner {
                std::mem::swap(song, &mut second_songs[i]);
                swapped[i] = true;
            }
        }

        self.parts[lead].found = lead_songs;
        self.parts[second].found = second_songs;
    }

    /// `foundSongs` debug view.
    pub fn found_songs_json(&self) -> Value {
        serde_json::to_value(&self.found_songs).unwrap_or(Value::Null)
    }

    /// `foundParts` debug view, in configured part order.
    pub fn found_parts_json(&self) -> Value {
        let map: Map<String, Value> = self
            .parts
            .iter()
            .map(|p| (p.part.clone(), serde_json::to_value(&p.found).unwrap_or(Value::Null)))
            .collect();
        Value::Object(map)
    }

    /// `notFoundParts` debug view, in configured part order.
    pub fn not_found_parts_json(&self) -> Value {
        let map: Map<String, Value> = self
            .parts
            .iter()
            .map(|p| (p.part.clone(), Value::from(p.not_found.clone())))
            .collect();
        Value::Object(map)
    }
}

/// Accumulates a `Resolution` in one pass and hands it over finished.
struct ResolutionBuilder {
    found_songs: FoundSongs,
    dividers: Vec<SetDivider>,
    parts: Vec<PartResolution>,
    positions: FxHashMap<String, usize>,
}

impl ResolutionBuilder {
    fn new<'a>(parts: impl Iterator<Item = &'a str>) -> Self {
        let parts: Vec<PartResolution> = parts.map(PartResolution::new).collect();
        let positions = parts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.part.clone(), i))
            .collect();
        Self {
            found_songs: FoundSongs::new(),
            dividers: Vec::new(),
            parts,
            positions,
        }
    }

    fn part_mut(&mut self, part: &str) -> &mut PartResolution {
        let i = self.positions[part];
        &mut self.parts[i]
    }

    fn divider(&mut self, divider: SetDivider) {
        self.dividers.push(divider);
    }

    fn song(&mut self, short_name: &str, records: Vec<SongRecord>) {
        self.found_songs.insert(short_name.to_string(), records);
    }

    fn found(&mut self, part: &str, song: SelectedSong) {
        self.part_mut(part).found.push(song);
    }

    fn not_found(&mut self, part: &str, title: &str) {
        self.part_mut(part).not_found.push(title.to_string());
    }

    fn placeholder(&mut self, part: &str, placeholder: Placeholder) {
        self.part_mut(part).placeholders.push(placeholder);
    }

    fn finish(self) -> Resolution {
        Resolution {
            found_songs: self.found_songs,
            dividers: self.dividers,
            parts: self.parts,
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Matches requests against one catalog.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    versions: EnsembleVersions,
    options: SetlistOptions,
    source_group: String,
    strict: bool,
    trumpet_swap: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, versions: EnsembleVersions, options: SetlistOptions) -> Self {
        Self {
            catalog,
            versions,
            options,
            source_group: String::new(),
            strict: false,
            trumpet_swap: true,
        }
    }

    /// Missing songs abort resolution for this source group.
    pub fn strict(mut self, source_group: &str, strict: bool) -> Self {
        self.source_group = source_group.to_string();
        self.strict = strict;
        self
    }

    pub fn trumpet_swap(mut self, enabled: bool) -> Self {
        self.trumpet_swap = enabled;
        self
    }

    fn key_matches(&self, record: &SongRecord, key: &str) -> bool {
        self.options.all_keys || record.key_or_empty() == key
    }

    /// Every catalog record for the requested song, regardless of part.
    pub fn find_all_songs(&self, request: &SongRequest) -> Vec<SongRecord> {
        let wanted = normalize_text(&request.short_name);
        let name_matches = |r: &SongRecord| {
            let name = normalize_text(&r.short_name);
            if request.exact {
                name == wanted
            } else {
                name.contains(&wanted)
            }
        };

        let mut candidates: Vec<&SongRecord> = self
            .catalog
            .songs
            .iter()
            .filter(|r| name_matches(r) && self.key_matches(r, &request.key))
            .collect();

        if candidates.is_empty() && !request.exact {
            candidates = self.catalog.songs.iter().filter(|r| name_matches(r)).collect();
            if !candidates.is_empty() {
                debug!(
                    "No '{}' in key '{}', using {} records in any key",
                    request.short_name,
                    request.key,
                    candidates.len()
                );
            }
        }

        candidates
            .into_iter()
            .filter(|r| self.versions.keeps(r))
            .cloned()
            .collect()
    }

    /// Records of a song whose part label fits the requested part.
    pub fn part_sources_raw(&self, songs: &[SongRecord], part: &PartId, exact: bool) -> Vec<SongRecord> {
        let name = part.name.as_str();
        songs
            .iter()
            .filter(|s| {
                if name.contains("bass") {
                    s.part == name
                } else if name.contains("aux") {
                    AUX_PARTS.iter().any(|p| s.part.contains(p))
                } else if name.contains("keys") {
                    KEYS_PARTS.iter().any(|p| s.part.contains(p))
                } else if exact {
                    s.part == name
                } else {
                    s.part.contains(name)
                }
            })
            .cloned()
            .collect()
    }

    /// Narrow part candidates by chair, then by horn-count preference.
    pub fn part_sources(&self, raw: Vec<SongRecord>, part: &PartId, key: &str) -> Vec<SongRecord> {
        let mut sources: Vec<SongRecord> = if part.chair > 0 {
            raw.iter().filter(|s| s.part_number == part.chair).cloned().collect()
        } else {
            Vec::new()
        };
        if sources.is_empty() {
            sources = raw.into_iter().filter(SongRecord::is_lead_chair).collect();
        }

        if self.options.num_horns == 0 {
            return sources;
        }
        self.prefer_horn_count(sources, key)
    }

    fn prefer_horn_count(&self, sources: Vec<SongRecord>, key: &str) -> Vec<SongRecord> {
        let preferred = self.options.num_horns;

        let mut order: Vec<String> = Vec::new();
        let mut groups: FxHashMap<String, Vec<SongRecord>> = FxHashMap::default();
        for s in sources {
            if !groups.contains_key(&s.short_name) {
                order.push(s.short_name.clone());
            }
            groups.entry(s.short_name.clone()).or_default().push(s);
        }

        let mut selected = Vec::new();
        for name in order {
            let group = groups.remove(&name).unwrap_or_default();
            let keyed = |r: &&SongRecord| self.key_matches(r, key);

            let exact: Vec<&SongRecord> = group
                .iter()
                .filter(keyed)
                .filter(|r| r.num_horns == Some(preferred))
                .collect();
            if !exact.is_empty() {
                selected.extend(exact.into_iter().cloned());
                continue;
            }

            let closest = closest_horn_count(group.iter().filter(keyed).filter_map(|r| r.num_horns), preferred);
            if let Some(count) = closest {
                debug!("{}: no {}-horn chart, using {} horns", name, preferred, count);
                selected.extend(
                    group
                        .iter()
                        .filter(keyed)
                        .filter(|r| r.num_horns == Some(count))
                        .cloned(),
                );
                continue;
            }

            selected.extend(group);
        }
        selected
    }

    /// Resolve every (song, part) slot of a setlist.
    pub fn resolve(&self, setlist: &SetlistSpec, parts: &PartSpec, progress: &ProgressBar) -> Result<Resolution> {
        let part_ids: Vec<PartId> = parts.parts().map(PartId::parse).collect();
        let mut builder = ResolutionBuilder::new(parts.parts());
        let total_slots = parts.slot_count() as u64;
        let mut done = 0u64;

        for (set_index, set) in setlist.sets.iter().enumerate() {
            let set_number = set_index + 1;
            builder.divider(SetDivider {
                set_number,
                name: set.name.clone(),
            });

            let requests: Vec<SongRequest> = set.songs.iter().map(|s| SongRequest::parse(s)).collect();
            let mut songs: Vec<Vec<SongRecord>> = Vec::with_capacity(requests.len());
            for request in &requests {
                let found = self.find_all_songs(request);
                if found.is_empty() {
                    if self.strict {
                        return Err(Error::SongNotFound {
                            title: request.short_name.clone(),
                            source_group: self.source_group.clone(),
                        });
                    }
                    let suggestions = suggest_titles(self.catalog, &request.short_name, 3);
                    if suggestions.is_empty() {
                        warn!("Song not found: {}", request.raw);
                    } else {
                        warn!("Song not found: {} (did you mean: {})", request.raw, suggestions.join(", "));
                    }
                }
                builder.song(&request.short_name, found.clone());
                songs.push(found);
            }

            for part in &part_ids {
                for (song_index, (request, found)) in requests.iter().zip(&songs).enumerate() {
                    let slot = format!("{}.{:02}", set_number, song_index + 1);
                    let raw = self.part_sources_raw(found, part, request.exact);
                    let mut sources = self.part_sources(raw, part, &request.key);

                    if part.is_aux() && sources.len() > 1 {
                        sources.retain(|s| s.part != DRUM_KIT);
                    }

                    if sources.is_empty() {
                        builder.not_found(&part.raw, &request.short_name);
                        if found.is_empty() {
                            builder.placeholder(
                                &part.raw,
                                Placeholder {
                                    file_stem: format!("{}. {} (NOT FOUND)", slot, request.raw),
                                    text: format!("Song not found: {}", request.raw),
                                },
                            );
                        }
                    } else {
                        for source in sources {
                            builder.found(&part.raw, SelectedSong::new(source, &slot));
                        }
                    }
                    progress.inc(1);
                    done += 1;
                    log_progress("resolve", done, total_slots, RESOLVE_LOG_INTERVAL);
                }
            }
        }

        let mut resolution = builder.finish();
        if self.trumpet_swap && !self.options.only_merge && self.versions.is_two_trumpet() {
            info!("Two-trumpet section: swapping trumpet 1 and trumpet 2 on regular tunes");
            resolution.swap_trumpet_parts();
        }
        Ok(resolution)
    }
}

/// Horn count other than `preferred` with the smallest `count % preferred`.
///
/// The search starts from `CLOSEST_HORNS_SENTINEL` and a later count replaces
/// the current one when its remainder is equal or smaller. `preferred` must be
/// non-zero.
pub fn closest_horn_count(counts: impl IntoIterator<Item = u32>, preferred: u32) -> Option<u32> {
    let mut best_remainder = CLOSEST_HORNS_SENTINEL;
    let mut best = None;
    for count in counts {
        if count == preferred {
            continue;
        }
        let remainder = count % preferred;
        if remainder <= best_remainder {
            best_remainder = remainder;
            best = Some(count);
        }
    }
    best
}
