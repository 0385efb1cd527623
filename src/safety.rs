//! Guards against wiping score libraries.
//!
//! A setlist directory is deleted and recreated on every run, so it must never
//! coincide with, contain, or sit inside a source directory. It must also leave
//! the catalogs, the instrument library and the setlists root itself alone.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Lexically normalize a path: absolute, `.` dropped, `..` applied.
fn canonical_form(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Check that `name` is a single plain path component.
///
/// Setlist names and the catalog and library folder names are joined onto
/// `setlists_dir`, so `""`, `.`, `..`, `a/b` and absolute paths are refused.
pub fn validate_dir_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(Error::UnsafeOutput(format!(
            "'{}' is not a plain directory name",
            name
        ))),
    }
}

/// Validate that `output` may be deleted and rebuilt.
///
/// Fails with `Error::UnsafeOutput` when `output` is the filesystem root, equals
/// a source directory, lies inside one, or contains one. `reserved_dirs` may
/// sit next to or above `output` but never be it or be inside it.
pub fn validate_output_dir(output: &Path, source_dirs: &[&Path], reserved_dirs: &[PathBuf]) -> Result<()> {
    let output = canonical_form(output);
    if output.parent().is_none() {
        return Err(Error::UnsafeOutput(format!(
            "refusing to rebuild filesystem root '{}'",
            output.display()
        )));
    }

    for reserved in reserved_dirs {
        let reserved = canonical_form(reserved);
        if reserved.starts_with(&output) {
            return Err(Error::UnsafeOutput(format!(
                "output '{}' would remove '{}'",
                output.display(),
                reserved.display()
            )));
        }
    }

    for source in source_dirs {
        let source = canonical_form(source);
        if output == source {
            return Err(Error::UnsafeOutput(format!(
                "output '{}' is a source directory",
                output.display()
            )));
        }
        if output.starts_with(&source) {
            return Err(Error::UnsafeOutput(format!(
                "output '{}' is inside source directory '{}'",
                output.display(),
                source.display()
            )));
        }
        if source.starts_with(&output) {
            return Err(Error::UnsafeOutput(format!(
                "output '{}' contains source directory '{}'",
                output.display(),
                source.display()
            )));
        }
    }
    Ok(())
}
