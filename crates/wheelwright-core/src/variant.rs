//! Interpreter variants: the per-version installations a wheel is built for.
//!
//! manylinux images ship one directory per interpreter ABI under
//! `/opt/python`, e.g. `cp27-cp27m`, `cp27-cp27mu`, `cp36-cp36m`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::VariantError;

/// One interpreter installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    /// The allow-list tag that selected this variant (e.g. `36`).
    pub tag: String,
    /// Directory name, e.g. `cp36-cp36m`.
    pub name: String,
    /// Installation directory.
    pub dir: PathBuf,
}

impl Variant {
    pub fn pip(&self) -> PathBuf {
        self.dir.join("bin").join("pip")
    }

    pub fn python(&self) -> PathBuf {
        self.dir.join("bin").join("python")
    }

    /// Dotted interpreter version parsed from the directory name
    /// (`cp36-cp36m` → `3.6`, `cp310-cp310` → `3.10`).
    pub fn python_version(&self) -> Option<String> {
        static RE: OnceLock<Option<Regex>> = OnceLock::new();
        let re = RE
            .get_or_init(|| Regex::new(r"^[a-z]+(\d)(\d+)(?:[-_]|$)").ok())
            .as_ref()?;
        let caps = re.captures(&self.name)?;
        Some(format!("{}.{}", &caps[1], &caps[2]))
    }
}

/// Enumerate interpreter directories under `root` named `<prefix><tag>*`.
///
/// Tags are visited in the given order and directories sorted by name within
/// a tag, matching what `ls -d root/cp{27,34}*` would list. A tag with no
/// match is skipped with a warning. A directory selected by an earlier tag is
/// not returned again.
pub fn discover_variants(
    root: &Path,
    prefix: &str,
    tags: &[String],
) -> Result<Vec<Variant>, VariantError> {
    if !root.is_dir() {
        return Err(VariantError::RootMissing(root.to_path_buf()));
    }

    let mut entries: Vec<(String, PathBuf)> = Vec::new();
    let read = std::fs::read_dir(root).map_err(|source| VariantError::ReadDir {
        path: root.to_path_buf(),
        source,
    })?;
    for entry in read {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            entries.push((name.to_string(), path.clone()));
        }
    }
    entries.sort();

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut variants = Vec::new();
    for tag in tags {
        let pattern = format!("{prefix}{tag}");
        let before = variants.len();
        for (name, dir) in &entries {
            if name.starts_with(&pattern) && seen.insert(dir.clone()) {
                variants.push(Variant {
                    tag: tag.clone(),
                    name: name.clone(),
                    dir: dir.clone(),
                });
            }
        }
        if variants.len() == before {
            tracing::warn!(
                "No interpreter matching {}* under {}, skipping",
                pattern,
                root.display()
            );
        }
    }
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_discover_variants_orders_by_tag_then_name() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["cp36-cp36m", "cp27-cp27mu", "cp27-cp27m", "cp37-cp37m", "pp27-pypy"] {
            fs::create_dir_all(tmp.path().join(name).join("bin")).unwrap();
        }
        fs::write(tmp.path().join("cp35-not-a-dir"), "").unwrap();

        let found = discover_variants(tmp.path(), "cp", &tags(&["36", "27", "35"])).unwrap();
        let names: Vec<&str> = found.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["cp36-cp36m", "cp27-cp27m", "cp27-cp27mu"]);
        assert_eq!(found[1].tag, "27");
        assert!(found[0].pip().ends_with("cp36-cp36m/bin/pip"));
        assert!(found[0].python().ends_with("cp36-cp36m/bin/python"));
    }

    #[test]
    fn test_discover_variants_no_duplicates_across_overlapping_tags() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("cp34-cp34m")).unwrap();
        let found = discover_variants(tmp.path(), "cp", &tags(&["3", "34"])).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tag, "3");
    }

    #[test]
    fn test_discover_variants_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_variants(&tmp.path().join("python"), "cp", &tags(&["27"])).unwrap_err();
        assert!(matches!(err, VariantError::RootMissing(_)));
    }

    #[test]
    fn test_python_version() {
        let v = |name: &str| Variant {
            tag: String::new(),
            name: name.to_string(),
            dir: PathBuf::from("/opt/python").join(name),
        };
        assert_eq!(v("cp27-cp27mu").python_version().as_deref(), Some("2.7"));
        assert_eq!(v("cp310-cp310").python_version().as_deref(), Some("3.10"));
        assert_eq!(v("weird").python_version(), None);
    }
}
