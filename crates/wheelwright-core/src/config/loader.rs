//! Environment variable loading.
//!
//! Keeps the fallback chains in one place so the rest of the code never
//! calls `std::env::var` directly.

use std::env;
use std::path::Path;

/// Load `.env` from the current directory into the process environment
/// (existing variables win). Runs at most once per process.
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let path = env::current_dir()
            .map(|d| d.join(".env"))
            .unwrap_or_else(|_| std::path::PathBuf::from(".env"));
        for (key, value) in read_dotenv(&path) {
            if env::var(&key).is_err() {
                set_env_var(&key, &value);
            }
        }
    });
}

/// Parse a `.env` file into key/value pairs. Missing or unreadable files yield nothing.
pub fn read_dotenv(path: &Path) -> Vec<(String, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        // Strip inline comment (# not inside quotes)
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Read `primary` or the first set alias, falling back to `default`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env_optional(primary, aliases).unwrap_or_else(default)
}

/// Read `primary` or the first set alias. Empty values count as unset.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .filter_map(|k| env::var(k).ok())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Boolean variable: 0/false/no/off are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    env_bool_optional(primary, aliases).unwrap_or(default)
}

/// Like [`env_bool`] but keeps "unset" distinguishable from "false".
pub fn env_bool_optional(primary: &str, aliases: &[&str]) -> Option<bool> {
    env_optional(primary, aliases).map(|s| {
        !matches!(
            s.to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        )
    })
}

/// Like [`env_list`] but a variable set to an empty string yields an empty
/// list instead of counting as unset.
pub fn env_list_allow_empty(primary: &str, aliases: &[&str]) -> Option<Vec<String>> {
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .find_map(|k| env::var(k).ok())
        .map(|s| split_list(&s))
}

/// List variable: comma and/or whitespace separated, empty items dropped.
pub fn env_list(primary: &str, aliases: &[&str]) -> Option<Vec<String>> {
    env_optional(primary, aliases).map(|s| split_list(&s))
}

/// Split a `27, 36 37` style list.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// All process-environment mutation goes through here. Callers must do it
// before spawning threads.

#[allow(unsafe_code)]
pub fn set_env_var(key: &str, value: &str) {
    unsafe { env::set_var(key, value) };
}

#[allow(unsafe_code)]
pub fn remove_env_var(key: &str) {
    unsafe { env::remove_var(key) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_mixed_separators() {
        assert_eq!(split_list("27, 34 35,,36"), vec!["27", "34", "35", "36"]);
        assert!(split_list("  , ").is_empty());
    }

    #[test]
    fn test_read_dotenv_quotes_and_comments() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(
            &path,
            "# comment\nWHEELWRIGHT_IMAGE=\"quay.io/pypa/manylinux2014_x86_64\"\n\
             export WHEELWRIGHT_PYTHON_VERSIONS=36,37 # trailing\nnot a pair\n",
        )
        .unwrap();
        let pairs = read_dotenv(&path);
        assert_eq!(
            pairs,
            vec![
                (
                    "WHEELWRIGHT_IMAGE".to_string(),
                    "quay.io/pypa/manylinux2014_x86_64".to_string()
                ),
                ("WHEELWRIGHT_PYTHON_VERSIONS".to_string(), "36,37".to_string()),
            ]
        );
    }

    #[test]
    fn test_read_dotenv_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_dotenv(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn test_env_helpers_empty_counts_as_unset() {
        set_env_var("WHEELWRIGHT_TEST_LOADER_EMPTY", "  ");
        set_env_var("WHEELWRIGHT_TEST_LOADER_ALIAS", "from-alias");
        assert_eq!(
            env_optional(
                "WHEELWRIGHT_TEST_LOADER_EMPTY",
                &["WHEELWRIGHT_TEST_LOADER_ALIAS"]
            ),
            Some("from-alias".to_string())
        );
        assert_eq!(
            env_or("WHEELWRIGHT_TEST_LOADER_UNSET", &[], || "d".to_string()),
            "d"
        );
        set_env_var("WHEELWRIGHT_TEST_LOADER_BOOL", "off");
        assert!(!env_bool("WHEELWRIGHT_TEST_LOADER_BOOL", &[], true));
        assert_eq!(env_bool_optional("WHEELWRIGHT_TEST_LOADER_UNSET", &[]), None);
        remove_env_var("WHEELWRIGHT_TEST_LOADER_EMPTY");
        remove_env_var("WHEELWRIGHT_TEST_LOADER_ALIAS");
        remove_env_var("WHEELWRIGHT_TEST_LOADER_BOOL");
    }

    #[test]
    fn test_env_list_allow_empty() {
        set_env_var("WHEELWRIGHT_TEST_LOADER_LIST", "");
        assert_eq!(env_list("WHEELWRIGHT_TEST_LOADER_LIST", &[]), None);
        assert_eq!(
            env_list_allow_empty("WHEELWRIGHT_TEST_LOADER_LIST", &[]),
            Some(Vec::new())
        );
        assert_eq!(env_list_allow_empty("WHEELWRIGHT_TEST_LOADER_NOPE", &[]), None);
        remove_env_var("WHEELWRIGHT_TEST_LOADER_LIST");
    }
}
