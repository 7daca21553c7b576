//! Configuration structs grouped by concern.
//!
//! Layering: built-in defaults, then `wheelwright.yaml`, then environment.
//! CLI flags are applied on top by the binary.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::env_keys::{build as build_keys, container as ctr_keys, observability as obv_keys};
use super::loader::{
    env_bool, env_bool_optional, env_list, env_list_allow_empty, env_optional, env_or, load_dotenv,
};
use crate::error::ConfigError;
use crate::recipe::BuildRecipe;

/// Manifest file looked up in the project root when none is given.
pub const MANIFEST_FILE: &str = "wheelwright.yaml";

pub const DEFAULT_IMAGE: &str = "quay.io/pypa/manylinux1_x86_64";
pub const DEFAULT_RUNTIME: &str = "docker";
pub const DEFAULT_MOUNT_PATH: &str = "/project";
pub const DEFAULT_INTERPRETERS_ROOT: &str = "/opt/python";
pub const DEFAULT_VERSION_TAGS: &[&str] = &["27", "34", "35", "36"];
pub const DEFAULT_IMPLEMENTATION: &str = "cp";
pub const DEFAULT_SYSTEM_PACKAGES: &[&str] = &["libffi-devel"];
pub const DEFAULT_WHEEL_DIR: &str = "wheelhouse";

/// `wheelwright.yaml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub image: Option<String>,
    pub container_runtime: Option<String>,
    pub mount_path: Option<PathBuf>,
    pub interpreters_root: Option<PathBuf>,
    pub python_versions: Option<Vec<String>>,
    pub implementation: Option<String>,
    pub system_packages: Option<Vec<String>>,
    pub wheel_dir: Option<PathBuf>,
    pub tty: Option<bool>,
    pub forward_env: Option<Vec<String>>,
    pub recipe: Option<BuildRecipe>,
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to `null`.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Resolved build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
    /// Project root; the working directory of every build command.
    pub project_dir: PathBuf,
    pub container_image: String,
    pub container_runtime: String,
    /// Where the project is mounted inside the container.
    pub mount_path: PathBuf,
    /// Parent directory of the per-version interpreter installations.
    pub interpreters_root: PathBuf,
    /// Ordered allow-list of version tags (`27`, `36`, ...).
    pub version_tags: Vec<String>,
    /// Implementation prefix of interpreter directory names (`cp`).
    pub implementation_prefix: String,
    pub system_packages: Vec<String>,
    /// Wheel output directory, relative to `project_dir`.
    pub wheel_dir: PathBuf,
    pub recipe: BuildRecipe,
    /// Attach a TTY to the container run; `None` means "if stdin is a terminal".
    pub tty: Option<bool>,
    /// Extra variable names forwarded into the container.
    pub forward_env: Vec<String>,
}

impl BuildConfig {
    /// Built-in defaults for a project rooted at `project_dir`.
    pub fn defaults(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            container_image: DEFAULT_IMAGE.to_string(),
            container_runtime: DEFAULT_RUNTIME.to_string(),
            mount_path: PathBuf::from(DEFAULT_MOUNT_PATH),
            interpreters_root: PathBuf::from(DEFAULT_INTERPRETERS_ROOT),
            version_tags: DEFAULT_VERSION_TAGS.iter().map(|s| s.to_string()).collect(),
            implementation_prefix: DEFAULT_IMPLEMENTATION.to_string(),
            system_packages: DEFAULT_SYSTEM_PACKAGES.iter().map(|s| s.to_string()).collect(),
            wheel_dir: PathBuf::from(DEFAULT_WHEEL_DIR),
            recipe: BuildRecipe::default(),
            tty: None,
            forward_env: Vec::new(),
        }
    }

    /// Defaults, then the manifest, then the environment (`.env` included).
    ///
    /// `manifest` names an explicit file that must exist; otherwise
    /// `<project_dir>/wheelwright.yaml` is used when present.
    pub fn load(project_dir: &Path, manifest: Option<&Path>) -> Result<Self, ConfigError> {
        load_dotenv();
        let mut config = Self::defaults(project_dir);

        let manifest_path = match manifest {
            Some(path) if !path.exists() => {
                return Err(ConfigError::ManifestNotFound(path.to_path_buf()))
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(project_dir.join(MANIFEST_FILE)).filter(|p| p.exists()),
        };
        if let Some(path) = manifest_path {
            tracing::debug!("Loading manifest {}", path.display());
            config.apply_manifest(Manifest::from_path(&path)?);
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_manifest(&mut self, manifest: Manifest) {
        let Manifest {
            image,
            container_runtime,
            mount_path,
            interpreters_root,
            python_versions,
            implementation,
            system_packages,
            wheel_dir,
            tty,
            forward_env,
            recipe,
        } = manifest;
        if let Some(v) = image {
            self.container_image = v;
        }
        if let Some(v) = container_runtime {
            self.container_runtime = v;
        }
        if let Some(v) = mount_path {
            self.mount_path = v;
        }
        if let Some(v) = interpreters_root {
            self.interpreters_root = v;
        }
        if let Some(v) = python_versions {
            self.version_tags = v;
        }
        if let Some(v) = implementation {
            self.implementation_prefix = v;
        }
        if let Some(v) = system_packages {
            self.system_packages = v;
        }
        if let Some(v) = wheel_dir {
            self.wheel_dir = v;
        }
        if tty.is_some() {
            self.tty = tty;
        }
        if let Some(v) = forward_env {
            self.forward_env = v;
        }
        if let Some(v) = recipe {
            self.recipe = v;
        }
    }

    /// Apply `WHEELWRIGHT_*` overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_optional(ctr_keys::WHEELWRIGHT_IMAGE, ctr_keys::IMAGE_ALIASES) {
            self.container_image = v;
        }
        if let Some(v) = env_optional(
            ctr_keys::WHEELWRIGHT_CONTAINER_RUNTIME,
            ctr_keys::CONTAINER_RUNTIME_ALIASES,
        ) {
            self.container_runtime = v;
        }
        if let Some(v) = env_optional(ctr_keys::WHEELWRIGHT_MOUNT_PATH, &[]) {
            self.mount_path = PathBuf::from(v);
        }
        if let Some(v) = env_optional(ctr_keys::WHEELWRIGHT_INTERPRETERS_ROOT, &[]) {
            self.interpreters_root = PathBuf::from(v);
        }
        if let Some(v) = env_list(ctr_keys::WHEELWRIGHT_FORWARD_ENV, &[]) {
            self.forward_env = v;
        }
        if let Some(v) = env_bool_optional(ctr_keys::WHEELWRIGHT_TTY, &[]) {
            self.tty = Some(v);
        }
        if let Some(v) = env_list(
            build_keys::WHEELWRIGHT_PYTHON_VERSIONS,
            build_keys::PYTHON_VERSIONS_ALIASES,
        ) {
            self.version_tags = v;
        }
        if let Some(v) = env_optional(build_keys::WHEELWRIGHT_IMPLEMENTATION, &[]) {
            self.implementation_prefix = v;
        }
        // Set but empty disables the system install step.
        if let Some(v) = env_list_allow_empty(build_keys::WHEELWRIGHT_SYSTEM_PACKAGES, &[]) {
            self.system_packages = v;
        }
        if let Some(v) = env_optional(build_keys::WHEELWRIGHT_WHEEL_DIR, &[]) {
            self.wheel_dir = PathBuf::from(v);
        }
        Ok(())
    }

    /// Normalize and check invariants: at least one tag, tags are plain
    /// tokens, duplicates dropped keeping the first occurrence.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        self.version_tags.retain(|t| seen.insert(t.clone()));
        if self.version_tags.is_empty() {
            return Err(ConfigError::NoVersionTags);
        }
        if let Some(bad) = self.version_tags.iter().find(|t| {
            t.is_empty()
                || !t
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        }) {
            return Err(ConfigError::InvalidVersionTag(bad.clone()));
        }
        if self.container_runtime.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: ctr_keys::WHEELWRIGHT_CONTAINER_RUNTIME.to_string(),
                value: self.container_runtime.clone(),
            });
        }
        if !self.mount_path.is_absolute() {
            return Err(ConfigError::InvalidValue {
                key: ctr_keys::WHEELWRIGHT_MOUNT_PATH.to_string(),
                value: self.mount_path.display().to_string(),
            });
        }
        self.check_wheel_dir()
    }

    /// The wheel dir is wiped before every build, so it must name a
    /// directory strictly inside the project.
    pub fn check_wheel_dir(&self) -> Result<(), ConfigError> {
        let mut normal = 0;
        for component in self.wheel_dir.components() {
            match component {
                Component::Normal(_) => normal += 1,
                Component::CurDir => {}
                _ => return Err(ConfigError::UnsafeWheelDir(self.wheel_dir.clone())),
            }
        }
        if normal == 0 {
            return Err(ConfigError::UnsafeWheelDir(self.wheel_dir.clone()));
        }
        Ok(())
    }

    /// Absolute wheel output directory.
    pub fn wheel_dir_path(&self) -> PathBuf {
        self.project_dir.join(&self.wheel_dir)
    }

    /// Directories whose joint presence means "inside the build container".
    pub fn container_markers(&self) -> [&Path; 2] {
        [self.mount_path.as_path(), self.interpreters_root.as_path()]
    }
}

/// Observability: quiet, log level, JSON output.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            load_dotenv();
            Self {
                quiet: env_bool(obv_keys::WHEELWRIGHT_QUIET, &[], false),
                log_level: env_or(obv_keys::WHEELWRIGHT_LOG_LEVEL, &[], || {
                    "wheelwright=info".to_string()
                }),
                log_json: env_bool(obv_keys::WHEELWRIGHT_LOG_JSON, &[], false),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_allow_list_and_markers() {
        let cfg = BuildConfig::defaults("/src");
        assert_eq!(cfg.version_tags, vec!["27", "34", "35", "36"]);
        assert_eq!(cfg.wheel_dir_path(), PathBuf::from("/src/wheelhouse"));
        assert_eq!(
            cfg.container_markers(),
            [Path::new("/project"), Path::new("/opt/python")]
        );
    }

    #[test]
    fn test_manifest_overrides_and_partial_recipe() {
        let manifest = Manifest::parse(
            "image: quay.io/pypa/manylinux2014_x86_64\n\
             python_versions: ['37', '38']\n\
             system_packages: [mysql-devel]\n\
             recipe:\n  toolchain_packages: [pip, setuptools, wheel]\n",
        )
        .unwrap();
        let mut cfg = BuildConfig::defaults("/src");
        cfg.apply_manifest(manifest);
        assert_eq!(cfg.container_image, "quay.io/pypa/manylinux2014_x86_64");
        assert_eq!(cfg.version_tags, vec!["37", "38"]);
        assert_eq!(cfg.system_packages, vec!["mysql-devel"]);
        assert_eq!(cfg.recipe.toolchain_packages, vec!["pip", "setuptools", "wheel"]);
        assert_eq!(cfg.recipe.bdist, BuildRecipe::default().bdist);
    }

    #[test]
    fn test_manifest_rejects_unknown_keys() {
        assert!(Manifest::parse("pythons: ['27']\n").is_err());
        assert_eq!(Manifest::parse("").unwrap(), Manifest::default());
    }

    #[test]
    fn test_load_explicit_manifest_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let err = BuildConfig::load(tmp.path(), Some(&tmp.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ManifestNotFound(_)));
    }

    #[test]
    fn test_load_reads_project_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(MANIFEST_FILE),
            "interpreters_root: /opt/pythons\nwheel_dir: dist-wheels\n",
        )
        .unwrap();
        let cfg = BuildConfig::load(tmp.path(), None).unwrap();
        assert_eq!(cfg.interpreters_root, PathBuf::from("/opt/pythons"));
        assert_eq!(cfg.wheel_dir_path(), tmp.path().join("dist-wheels"));
    }

    #[test]
    fn test_validate_dedups_and_rejects_bad_tags() {
        let mut cfg = BuildConfig::defaults("/src");
        cfg.version_tags = vec!["36".into(), "27".into(), "36".into()];
        cfg.validate().unwrap();
        assert_eq!(cfg.version_tags, vec!["36", "27"]);

        cfg.version_tags = vec!["3*".into()];
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidVersionTag(t)) if t == "3*"));

        cfg.version_tags.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::NoVersionTags)));
    }

    #[test]
    fn test_validate_rejects_wheel_dir_outside_project() {
        let mut cfg = BuildConfig::defaults("/src");
        for bad in ["", ".", "./", "..", "../out", "wheels/../..", "/tmp/wheels"] {
            cfg.wheel_dir = PathBuf::from(bad);
            assert!(
                matches!(cfg.validate(), Err(ConfigError::UnsafeWheelDir(_))),
                "{bad:?} accepted"
            );
        }
        for good in ["wheelhouse", "./wheelhouse", "out/wheels"] {
            cfg.wheel_dir = PathBuf::from(good);
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn test_load_rejects_dot_wheel_dir_from_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILE), "wheel_dir: .\n").unwrap();
        let err = BuildConfig::load(tmp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::UnsafeWheelDir(_)));
    }

    #[test]
    fn test_validate_requires_absolute_mount_path() {
        let mut cfg = BuildConfig::defaults("/src");
        cfg.mount_path = PathBuf::from("project");
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidValue { .. })));
    }
}
