//! Closing report for a setlist run.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::merge::MergeReport;
use crate::resolve::Resolution;

#[derive(Default, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub setlist: String,
    pub total_parts_found: usize,
    pub total_not_found: usize,
    /// Part -> titles that could not be resolved; parts without gaps omitted
    pub not_found: BTreeMap<String, Vec<String>>,
    pub merged: Vec<String>,
    pub failed_merges: Vec<String>,
    pub elapsed_seconds: f64,
}

impl RunSummary {
    pub fn new(setlist: &str, resolution: &Resolution, merges: &MergeReport, elapsed: Duration) -> Self {
        let not_found = resolution
            .parts
            .iter()
            .filter(|p| !p.not_found.is_empty())
            .map(|p| (p.part.clone(), p.not_found.clone()))
            .collect();
        Self {
            setlist: setlist.to_string(),
            total_parts_found: resolution.total_found(),
            total_not_found: resolution.total_not_found(),
            not_found,
            merged: merges.merged.clone(),
            failed_merges: merges.failed.clone(),
            elapsed_seconds: elapsed.as_secs_f64(),
        }
    }

    /// Print the closing banner to stdout.
    pub fn log(&self) {
        let rule = format!("{:=<40}", "");
        println!("\n{}", rule);
        println!("  Total Parts Found: {}", self.total_parts_found);
        println!("{}", rule);
        println!("  Parts Not Found: {}", self.total_not_found);
        for (part, songs) in &self.not_found {
            println!("    {}", part);
            for song in songs {
                println!("      {}", song);
            }
        }
        println!("{}", rule);
        if self.failed_merges.is_empty() {
            println!("  Successfully merged all parts!");
        } else {
            println!("  Failed to merge:");
            for part in &self.failed_merges {
                println!("    {}", part);
            }
        }
        println!("  Elapsed: {:.2}s", self.elapsed_seconds);
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartResolution;

    fn resolution() -> Resolution {
        let mut trombone = PartResolution::new("trombone");
        trombone.not_found.push("Alpha".to_string());
        Resolution {
            parts: vec![trombone, PartResolution::new("bass")],
            ..Resolution::default()
        }
    }

    #[test]
    fn test_summary_collects_gaps_and_failures() {
        let merges = MergeReport {
            merged: vec!["bass".to_string()],
            failed: vec!["trombone".to_string()],
        };
        let summary = RunSummary::new("Gig", &resolution(), &merges, Duration::from_millis(1250));

        assert_eq!(summary.total_parts_found, 0);
        assert_eq!(summary.total_not_found, 1);
        assert_eq!(summary.not_found.keys().collect::<Vec<_>>(), vec!["trombone"]);
        assert_eq!(summary.failed_merges, vec!["trombone"]);
        assert!((summary.elapsed_seconds - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("summary.json");
        let summary = RunSummary::new("Gig", &resolution(), &MergeReport::default(), Duration::ZERO);
        summary.write_to_file(&path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["setlist"], "Gig");
        assert_eq!(json["totalNotFound"], 1);
        assert_eq!(json["notFound"]["trombone"][0], "Alpha");
    }
}
