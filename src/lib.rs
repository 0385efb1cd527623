//! Setlist builder library - shared modules for all binaries.
//!
//! Builds per-source-group catalogs from sheet-music file names, resolves a
//! setlist against a catalog part by part, writes the per-part folders and
//! hands each folder to an external merge program.

pub mod catalog;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod output;
pub mod parse;
pub mod pdf;
pub mod progress;
pub mod resolve;
pub mod safety;
pub mod suggest;
pub mod summary;

pub use catalog::Catalog;
pub use config::{SetlistConfig, SourcesConfig};
pub use ensemble::{classify_ensemble, EnsembleVersions};
pub use error::{Error, Result};
pub use models::{PartSpec, SelectedSong, SetlistSpec, SongRecord};
pub use parse::{FilenameParser, NamingConvention};
pub use resolve::{Resolution, Resolver};
pub use summary::RunSummary;
