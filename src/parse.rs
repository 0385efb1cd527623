//! Filename parsing into `SongRecord`s.
//!
//! Two naming conventions are in use across source groups:
//!
//! - Convention A: `<song> - <part>[ <number>][ (<custom>)].pdf`
//! - Convention B: `<song> - <n>H - <key> - <part>.pdf`, or
//!   `<song> - <part> (<n>horns).pdf` when the name carries a parenthetical
//!
//! Parsing never fails. A name that fits neither shape yields a record with an
//! empty `short_name` and `part`, which matches nothing downstream.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::SongRecord;
use crate::normalize::{normalize_key, normalize_text, split_segments, strip_extension, SEGMENT_DELIMITER};

/// Extension of every file the catalog considers.
pub const SHEET_MUSIC_EXTENSION: &str = ".pdf";

/// Horn count when a parenthetical arrangement name omits it.
pub const DEFAULT_PAREN_HORNS: u32 = 2;

/// "4h", "4 h"
static HORN_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(\d+)\s*h$").unwrap());

/// "(3horns)", "(3 horns)", "(1 horn)"
static HORN_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\(\s*(\d+)\s*-?\s*horns?\s*\)").unwrap());

/// Turns a bare filename into a record.
pub trait FilenameParser {
    fn parse(&self, file_name: &str, file_path: &Path) -> SongRecord;
}

/// Naming convention of a source group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingConvention {
    #[serde(rename = "a", alias = "A")]
    A,
    #[serde(rename = "b", alias = "B")]
    B,
}

impl FilenameParser for NamingConvention {
    fn parse(&self, file_name: &str, file_path: &Path) -> SongRecord {
        match self {
            NamingConvention::A => ConventionA.parse(file_name, file_path),
            NamingConvention::B => ConventionB.parse(file_name, file_path),
        }
    }
}

/// `<song> - <part>[ <number>][ (<custom>)]`
#[derive(Clone, Copy, Debug, Default)]
pub struct ConventionA;

/// `<song> - <n>H - <key> - <part>`
#[derive(Clone, Copy, Debug, Default)]
pub struct ConventionB;

impl FilenameParser for ConventionA {
    fn parse(&self, file_name: &str, file_path: &Path) -> SongRecord {
        let full_name = strip_extension(file_name, SHEET_MUSIC_EXTENSION).unwrap_or(file_name);
        let mut record = SongRecord::unparsed(full_name, &file_path.display().to_string());

        let normalized = normalize_text(full_name);
        let segments = split_segments(&normalized);
        let Some((descriptor, song)) = segments.split_last() else {
            return record;
        };
        if song.is_empty() {
            return record;
        }

        let (part, part_number) = split_chair(descriptor);
        record.short_name = song.join(SEGMENT_DELIMITER);
        record.part = part;
        record.part_number = part_number;
        record
    }
}

impl FilenameParser for ConventionB {
    fn parse(&self, file_name: &str, file_path: &Path) -> SongRecord {
        let full_name = strip_extension(file_name, SHEET_MUSIC_EXTENSION).unwrap_or(file_name);
        let mut record = SongRecord::unparsed(full_name, &file_path.display().to_string());

        let normalized = normalize_text(full_name);
        let segments = split_segments(&normalized);

        if normalized.contains('(') {
            let Some((last, song)) = segments.split_last() else {
                return record;
            };
            if song.is_empty() {
                return record;
            }
            let num_horns = HORN_PAREN
                .captures(last)
                .and_then(|caps| caps[1].parse().ok())
                .filter(|&n: &u32| n > 0)
                .unwrap_or(DEFAULT_PAREN_HORNS);
            let (part, part_number) = split_chair(last);

            record.short_name = song.join(SEGMENT_DELIMITER);
            record.part = part;
            record.part_number = part_number;
            record.num_horns = Some(num_horns);
            return record;
        }

        let [song, horns, key, descriptor] = segments.as_slice() else {
            return record;
        };
        let (part, part_number) = split_chair(descriptor);

        record.short_name = song.to_string();
        record.part = part;
        record.part_number = part_number;
        record.key = normalize_key(key);
        record.num_horns = HORN_SEGMENT
            .captures(horns)
            .and_then(|caps| caps[1].parse().ok())
            .filter(|&n: &u32| n > 0);
        record
    }
}

/// Split "trumpet 2 (lead)" into ("trumpet", 2).
///
/// The parenthesized custom name is dropped. A trailing numeric token is the
/// chair; anything else stays part of the part name and the chair is 0.
pub fn split_chair(descriptor: &str) -> (String, u32) {
    let without_custom = descriptor.split('(').next().unwrap_or("").trim();
    if let Some((name, last)) = without_custom.rsplit_once(' ') {
        if let Ok(number) = last.parse::<u32>() {
            return (name.trim().to_string(), number);
        }
    }
    (without_custom.to_string(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_a(name: &str) -> SongRecord {
        NamingConvention::A.parse(name, Path::new("/scores/a").join(name).as_path())
    }

    fn parse_b(name: &str) -> SongRecord {
        NamingConvention::B.parse(name, Path::new("/scores/b").join(name).as_path())
    }

    #[test]
    fn test_split_chair() {
        assert_eq!(split_chair("trumpet 2"), ("trumpet".to_string(), 2));
        assert_eq!(split_chair("trombone"), ("trombone".to_string(), 0));
        assert_eq!(split_chair("alto sax 1 (jane)"), ("alto sax".to_string(), 1));
        assert_eq!(split_chair("tenor (solo)"), ("tenor".to_string(), 0));
        assert_eq!(split_chair("2"), ("2".to_string(), 0));
    }

    #[test]
    fn test_convention_a_numbered_part() {
        let r = parse_a("Alpha - Trumpet 2.pdf");
        assert_eq!(r.short_name, "alpha");
        assert_eq!(r.full_name, "Alpha - Trumpet 2");
        assert_eq!(r.part, "trumpet");
        assert_eq!(r.part_number, 2);
        assert_eq!(r.key, None);
        assert_eq!(r.num_horns, None);
        assert_eq!(r.file_path, "/scores/a/Alpha - Trumpet 2.pdf");
    }

    #[test]
    fn test_convention_a_unnumbered_part() {
        let r = parse_a("Alpha - Trombone.pdf");
        assert_eq!(r.part, "trombone");
        assert_eq!(r.part_number, 0);
        assert_eq!(format!("{} {}", r.part, r.part_number), "trombone 0");
    }

    #[test]
    fn test_convention_a_custom_name_and_parenthesized_title() {
        let r = parse_a("Song (Live) - Alto 1 (Jane).pdf");
        assert_eq!(r.short_name, "song (live)");
        assert_eq!(r.part, "alto");
        assert_eq!(r.part_number, 1);
    }

    #[test]
    fn test_convention_a_extra_segments_stay_in_title() {
        let r = parse_a("Medley - Part One - Bass.pdf");
        assert_eq!(r.short_name, "medley - part one");
        assert_eq!(r.part, "bass");
    }

    #[test]
    fn test_convention_a_unparsable() {
        let r = parse_a("Scratch.pdf");
        assert!(!r.is_parsed());
        assert_eq!(r.short_name, "");
        assert_eq!(r.part, "");
        assert_eq!(r.full_name, "Scratch");
    }

    #[test]
    fn test_convention_b_four_segments() {
        let r = parse_b("September - 4H - Bbmaj - Trumpet.pdf");
        assert_eq!(r.short_name, "september");
        assert_eq!(r.num_horns, Some(4));
        assert_eq!(r.key.as_deref(), Some("Bb"));
        assert_eq!(r.part, "trumpet");
        assert_eq!(r.part_number, 0);
    }

    #[test]
    fn test_convention_b_key_is_title_cased_without_maj() {
        for name in ["Tune - 3h - EB MAJ - Alto.pdf", "Tune - 3H - ebmaj - Alto.pdf"] {
            let r = parse_b(name);
            let key = r.key.unwrap();
            assert_eq!(key, "Eb");
            assert!(!key.to_lowercase().contains("maj"));
            assert!(r.num_horns.unwrap() > 0);
        }
    }

    #[test]
    fn test_convention_b_numbered_part() {
        let r = parse_b("Tune - 5H - C - Trumpet 2.pdf");
        assert_eq!(r.part, "trumpet");
        assert_eq!(r.part_number, 2);
    }

    #[test]
    fn test_convention_b_parenthetical() {
        let r = parse_b("Get Lucky - Bb - Tenor (3horns).pdf");
        assert_eq!(r.short_name, "get lucky - bb");
        assert_eq!(r.part, "tenor");
        assert_eq!(r.num_horns, Some(3));
        assert_eq!(r.key, None);
    }

    #[test]
    fn test_convention_b_parenthetical_defaults_to_two_horns() {
        let r = parse_b("Get Lucky - Tenor (Solo).pdf");
        assert_eq!(r.short_name, "get lucky");
        assert_eq!(r.part, "tenor");
        assert_eq!(r.num_horns, Some(DEFAULT_PAREN_HORNS));

        let r = parse_b("Get Lucky - Tenor (0 horns).pdf");
        assert_eq!(r.num_horns, Some(DEFAULT_PAREN_HORNS));
    }

    #[test]
    fn test_convention_b_wrong_segment_count() {
        assert!(!parse_b("Tune - Trumpet.pdf").is_parsed());
        assert!(!parse_b("Tune.pdf").is_parsed());
    }

    #[test]
    fn test_convention_b_unparsable_horns() {
        let r = parse_b("Tune - Big - C - Bass.pdf");
        assert_eq!(r.short_name, "tune");
        assert_eq!(r.num_horns, None);
        assert_eq!(r.key.as_deref(), Some("C"));

        let r = parse_b("Tune - 0H - C - Bass.pdf");
        assert_eq!(r.short_name, "tune");
        assert_eq!(r.num_horns, None);

        let r = parse_b("Tune - 03H - C - Bass.pdf");
        assert_eq!(r.num_horns, Some(3));
    }
}
