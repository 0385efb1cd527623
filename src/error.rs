//! Error type shared by the library.
//!
//! Filename parsing never fails and most resolution gaps are collected rather than
//! raised, so the variants here cover the conditions that stop a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Song not found: {title} (source group '{source_group}')")]
    SongNotFound { title: String, source_group: String },
    #[error("No source exists for: {0}")]
    UnknownSourceGroup(String),
    #[error("Safety check failed: {0}")]
    UnsafeOutput(String),
    #[error("Merge failed for part '{part}': {reason}")]
    Merge { part: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
