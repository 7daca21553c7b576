//! Filesystem cleanup around each variant: `dist`, `build`, `*.egg-info`
//! and the wheel output directory.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use wheelwright_core::{is_child_pattern, BuildError, ConfigError};

/// Remove a directory tree. Absent is fine; returns whether anything was removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool, BuildError> {
    match fs::symlink_metadata(path) {
        Ok(_) => {
            remove_entry(path)?;
            tracing::debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

/// Remove `root/<pattern>` for every pattern. Returns the removed paths, sorted.
pub fn remove_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, BuildError> {
    let found = find_patterns(root, patterns)?;
    for path in &found {
        remove_entry(path)?;
        tracing::debug!("Removed {}", path.display());
    }
    Ok(found)
}

/// Existing entries of `root` whose name matches one of `patterns`, sorted.
///
/// Patterns are globs over direct child names (`dist`, `*.egg*`,
/// `build-[0-9]`). Empty, absolute, `.` and `..` patterns are ignored so
/// nothing outside `root` can be touched.
pub fn find_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, BuildError> {
    let children: Vec<&str> = patterns
        .iter()
        .map(String::as_str)
        .filter(|p| {
            let ok = is_child_pattern(p);
            if !ok {
                tracing::warn!(
                    "Ignoring clean pattern '{}' (must name an entry inside the project)",
                    p
                );
            }
            ok
        })
        .collect();
    if children.is_empty() {
        return Ok(Vec::new());
    }
    let set = compile_globset(&children)?;
    let mut found = entries_where(root, |path| {
        path.file_name().map_or(false, |name| set.is_match(name))
    })?;
    found.sort();
    Ok(found)
}

/// Regular files in `dir` whose name matches `glob`, sorted. A missing dir is empty.
pub fn list_matching(dir: &Path, glob: &str) -> Result<Vec<PathBuf>, BuildError> {
    let matcher = Glob::new(glob).map_err(|e| invalid_glob(glob, e))?.compile_matcher();
    let mut files = entries_where(dir, |path| {
        path.is_file() && path.file_name().map_or(false, |name| matcher.is_match(name))
    })?;
    files.sort();
    Ok(files)
}

fn compile_globset(patterns: &[&str]) -> Result<GlobSet, BuildError> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        b.add(Glob::new(p).map_err(|e| invalid_glob(p, e))?);
    }
    b.build().map_err(|e| invalid_glob(&patterns.join(","), e))
}

fn invalid_glob(pattern: &str, e: globset::Error) -> BuildError {
    BuildError::Config(ConfigError::InvalidGlob {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Entries of `dir` accepted by `keep`. Unreadable entries are logged and skipped.
fn entries_where(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, BuildError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BuildError::io(dir, e)),
    };
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if keep(&path) {
                    paths.push(path);
                }
            }
            Err(e) => tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e),
        }
    }
    Ok(paths)
}

fn remove_entry(path: &Path) -> Result<(), BuildError> {
    let meta = fs::symlink_metadata(path).map_err(|e| BuildError::io(path, e))?;
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| BuildError::io(path, e))
}
