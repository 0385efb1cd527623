//! Configuration files.
//!
//! `sources.toml` names the source groups and where their scores live.
//! `setlist.toml` describes one gig: the parts to build and the sets to play.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{PartSpec, SetSpec, SetlistOptions, SetlistSpec};
use crate::parse::NamingConvention;
use crate::safety::validate_dir_name;

fn default_setlists_dir() -> PathBuf {
    PathBuf::from("setlists")
}

fn default_sources_dir() -> String {
    "_sources".to_string()
}

fn default_all_dir() -> String {
    "_all".to_string()
}

fn default_ignore_patterns() -> Vec<String> {
    vec!["---".to_string(), "__".to_string(), "node".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_merge_command() -> Vec<String> {
    vec!["python".to_string(), "merge.py".to_string()]
}

fn default_cleanup_suffix() -> String {
    "_temp-toc.pdf".to_string()
}

/// One group of score directories sharing a naming convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceGroup {
    pub convention: NamingConvention,
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    /// Song-not-found aborts the run instead of producing a placeholder
    #[serde(default)]
    pub strict: bool,
    /// Allow the two-trumpet part swap for this group
    #[serde(default = "default_true")]
    pub trumpet_swap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Program followed by its leading arguments
    #[serde(default = "default_merge_command")]
    pub command: Vec<String>,
    /// Scratch file `<merged><suffix>` removed after each merge
    #[serde(default = "default_cleanup_suffix")]
    pub cleanup_suffix: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            command: default_merge_command(),
            cleanup_suffix: default_cleanup_suffix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_setlists_dir")]
    pub setlists_dir: PathBuf,
    #[serde(default = "default_sources_dir")]
    pub sources_dir: String,
    #[serde(default = "default_all_dir")]
    pub all_dir: String,
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub groups: BTreeMap<String, SourceGroup>,
    #[serde(default)]
    pub merge: MergeConfig,
}

impl SourcesConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: SourcesConfig = read_toml(path)?;
        let base = config_base(path);
        config.setlists_dir = resolve(&base, &config.setlists_dir);
        for group in config.groups.values_mut() {
            group.dirs = group.dirs.iter().map(|d| resolve(&base, d)).collect();
        }
        if config.merge.command.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "merge.command must name a program ({})",
                path.display()
            )));
        }
        for (key, name) in [("sources_dir", &config.sources_dir), ("all_dir", &config.all_dir)] {
            validate_dir_name(name)
                .map_err(|e| Error::InvalidConfig(format!("{}: {} ({})", key, e, path.display())))?;
        }
        if config.sources_dir == config.all_dir {
            return Err(Error::InvalidConfig(format!(
                "sources_dir and all_dir must differ ({})",
                path.display()
            )));
        }
        Ok(config)
    }

    pub fn group(&self, name: &str) -> Result<&SourceGroup> {
        self.groups
            .get(name)
            .ok_or_else(|| Error::UnknownSourceGroup(name.to_string()))
    }

    /// Directory holding one catalog JSON per group.
    pub fn catalogs_dir(&self) -> PathBuf {
        self.setlists_dir.join(&self.sources_dir)
    }

    pub fn catalog_path(&self, group: &str) -> PathBuf {
        self.catalogs_dir().join(format!("{}.json", group))
    }

    pub fn all_songs_dir(&self) -> PathBuf {
        self.setlists_dir.join(&self.all_dir)
    }

    /// Directories no setlist rebuild may remove: the setlists root, the
    /// catalogs and the instrument library.
    pub fn reserved_dirs(&self) -> Vec<PathBuf> {
        vec![self.setlists_dir.clone(), self.catalogs_dir(), self.all_songs_dir()]
    }

    /// Every directory any group scans.
    pub fn source_dirs(&self) -> Vec<&Path> {
        self.groups
            .values()
            .flat_map(|g| g.dirs.iter().map(PathBuf::as_path))
            .collect()
    }
}

/// On-disk shape of `setlist.toml`.
#[derive(Debug, Deserialize)]
struct RawSetlistConfig {
    name: String,
    source: String,
    #[serde(default)]
    options: SetlistOptions,
    #[serde(default)]
    sets: Vec<SetSpec>,
    #[serde(default)]
    parts: Vec<String>,
}

/// A setlist plus the parts it should be built for.
#[derive(Debug, Clone, PartialEq)]
pub struct SetlistConfig {
    pub setlist: SetlistSpec,
    /// Ordered part identifiers: "trumpet 1", "bass", "aux"
    pub parts: Vec<String>,
}

impl SetlistConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw: RawSetlistConfig = read_toml(path)?;
        let config = SetlistConfig {
            setlist: SetlistSpec {
                name: raw.name,
                source: raw.source,
                options: raw.options,
                sets: raw.sets,
            },
            parts: raw.parts,
        };
        if config.parts.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "setlist '{}' lists no parts ({})",
                config.setlist.name,
                path.display()
            )));
        }
        if config.setlist.name.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "setlist name is empty ({})",
                path.display()
            )));
        }
        // Both become folder names under setlists_dir
        for name in std::iter::once(&config.setlist.name).chain(&config.parts) {
            validate_dir_name(name).map_err(|e| Error::InvalidConfig(format!("{} ({})", e, path.display())))?;
        }
        Ok(config)
    }

    pub fn part_spec(&self) -> PartSpec {
        PartSpec::from_setlist(&self.parts, &self.setlist)
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn config_base(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
