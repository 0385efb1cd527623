//! Ensemble-version classification for cover-band arrangements.
//!
//! Some catalog entries exist in several sizes, tagged in the file name as
//! "(S", "(M" or "(Cover". The configured part list decides, per instrument
//! family, which size this band plays.

use serde::Serialize;
use std::fmt;

use crate::models::SongRecord;
use crate::normalize::normalize_text;

/// Markers identifying a cover-band arrangement in a full name.
pub const COVER_MARKERS: [&str; 3] = ["(Cover", "(M", "(S"];

const SAX_PARTS: [&str; 3] = ["alto", "tenor", "bari"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Version {
    /// Standard
    S,
    /// Medium, the two-trumpet/three-sax configuration
    M,
    Cover,
}

impl Version {
    pub fn tag(self) -> &'static str {
        match self {
            Version::S => "S",
            Version::M => "M",
            Version::Cover => "Cover",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Family {
    Sax,
    Trumpet,
    Trombone,
    Rhythm,
}

/// Version tag per instrument family, computed once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnsembleVersions {
    pub sax: Version,
    pub trumpet: Version,
    pub trombone: Version,
    pub rhythm: Version,
}

impl Default for EnsembleVersions {
    fn default() -> Self {
        Self {
            sax: Version::S,
            trumpet: Version::S,
            trombone: Version::S,
            rhythm: Version::S,
        }
    }
}

impl EnsembleVersions {
    pub fn for_family(&self, family: Family) -> Version {
        match family {
            Family::Sax => self.sax,
            Family::Trumpet => self.trumpet,
            Family::Trombone => self.trombone,
            Family::Rhythm => self.rhythm,
        }
    }

    /// Two trumpets: the book owner swaps to the lower chair on regular tunes.
    pub fn is_two_trumpet(&self) -> bool {
        self.trumpet == Version::M
    }

    /// Whether a record survives the cover-band filter.
    ///
    /// Records without a cover marker always pass. Tagged records pass only when
    /// their name carries the version computed for their family.
    pub fn keeps(&self, record: &SongRecord) -> bool {
        if !is_cover_tune(&record.full_name) {
            return true;
        }
        let version = self.for_family(family_of(&record.part));
        record.full_name.contains(version.tag())
    }
}

/// Derive the version tags from the configured part identifiers.
///
/// Identifiers are normalized first, so "Trumpet 1" counts as a trumpet.
pub fn classify_ensemble<S: AsRef<str>>(parts: &[S]) -> EnsembleVersions {
    let names: Vec<String> = parts.iter().map(|p| normalize_text(p.as_ref())).collect();
    let count = |pred: fn(&str) -> bool| names.iter().filter(|p| pred(p.as_str())).count();

    let num_saxes = count(|p| SAX_PARTS.iter().any(|sax| p.contains(sax)));
    let num_trumpets = count(|p| p.contains("trumpet"));
    let num_bones = count(|p| p.contains("bone"));

    let sax = match num_saxes {
        3 => Version::M,
        4 => Version::Cover,
        _ => Version::S,
    };
    let trumpet = match num_trumpets {
        2 => Version::M,
        3 => Version::Cover,
        _ => Version::S,
    };
    let trombone = if num_bones > 1 { Version::Cover } else { trumpet };
    let rhythm = if trombone == Version::S { Version::S } else { Version::Cover };

    EnsembleVersions {
        sax,
        trumpet,
        trombone,
        rhythm,
    }
}

/// Instrument family of a record's part label.
pub fn family_of(part: &str) -> Family {
    if part.contains("trumpet") {
        Family::Trumpet
    } else if part.contains("bone") {
        Family::Trombone
    } else if SAX_PARTS.contains(&part) {
        Family::Sax
    } else {
        Family::Rhythm
    }
}

pub fn is_cover_tune(full_name: &str) -> bool {
    COVER_MARKERS.iter().any(|marker| full_name.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn record(full_name: &str, part: &str) -> SongRecord {
        SongRecord {
            short_name: "tune".to_string(),
            full_name: full_name.to_string(),
            part: part.to_string(),
            ..SongRecord::default()
        }
    }

    #[test]
    fn test_classify_small_band() {
        let v = classify_ensemble(&parts(&["alto", "trumpet", "bass", "drums"]));
        assert_eq!(v, EnsembleVersions::default());
        assert!(!v.is_two_trumpet());
    }

    #[test]
    fn test_classify_two_trumpets() {
        let v = classify_ensemble(&parts(&["alto 1", "tenor", "bari", "trumpet 1", "trumpet 2", "bass"]));
        assert_eq!(v.sax, Version::M);
        assert_eq!(v.trumpet, Version::M);
        assert_eq!(v.trombone, Version::M);
        assert_eq!(v.rhythm, Version::Cover);
        assert!(v.is_two_trumpet());
    }

    #[test]
    fn test_classify_ignores_case_of_configured_parts() {
        let v = classify_ensemble(&parts(&["Alto 1", "TENOR", "Bari", "Trumpet 1", "Trumpet  2", "Bass"]));
        assert_eq!(v.sax, Version::M);
        assert_eq!(v.trumpet, Version::M);
        assert!(v.is_two_trumpet());
    }

    #[test]
    fn test_classify_full_section() {
        let v = classify_ensemble(&parts(&[
            "alto 1", "alto 2", "tenor", "bari", "trumpet 1", "trumpet 2", "trumpet 3", "trombone 1",
            "trombone 2",
        ]));
        assert_eq!(v.sax, Version::Cover);
        assert_eq!(v.trumpet, Version::Cover);
        assert_eq!(v.trombone, Version::Cover);
        assert_eq!(v.rhythm, Version::Cover);
    }

    #[test]
    fn test_trombone_mirrors_trumpet_with_single_bone() {
        let v = classify_ensemble(&parts(&["trumpet 1", "trumpet 2", "trumpet 3", "trombone"]));
        assert_eq!(v.trombone, Version::Cover);
        let v = classify_ensemble(&parts(&["trumpet", "trombone"]));
        assert_eq!(v.trombone, Version::S);
        assert_eq!(v.rhythm, Version::S);
    }

    #[test]
    fn test_family_of() {
        assert_eq!(family_of("trumpet"), Family::Trumpet);
        assert_eq!(family_of("trombone"), Family::Trombone);
        assert_eq!(family_of("bass bone"), Family::Trombone);
        assert_eq!(family_of("tenor"), Family::Sax);
        assert_eq!(family_of("tenor sax"), Family::Rhythm);
        assert_eq!(family_of("keys"), Family::Rhythm);
    }

    #[test]
    fn test_is_cover_tune() {
        assert!(is_cover_tune("Tune (Cover) - Trumpet 1"));
        assert!(is_cover_tune("Tune (M) - Alto"));
        assert!(is_cover_tune("Tune (S) - Bass"));
        assert!(!is_cover_tune("Tune (Live) - Bass"));
        assert!(!is_cover_tune("Tune - Bass"));
    }

    #[test]
    fn test_keeps_filters_cover_versions_by_family() {
        let v = classify_ensemble(&parts(&["alto", "tenor", "bari", "trumpet 1", "trumpet 2", "bass"]));

        assert!(v.keeps(&record("Tune - Bass", "bass")));
        assert!(v.keeps(&record("Tune (M) - Trumpet 1", "trumpet")));
        assert!(!v.keeps(&record("Tune (S) - Trumpet 1", "trumpet")));
        assert!(v.keeps(&record("Tune (Cover) - Bass", "bass")));
        assert!(!v.keeps(&record("Tune (M) - Bass", "bass")));
        assert!(v.keeps(&record("Tune (M) - Alto", "alto")));
    }
}
