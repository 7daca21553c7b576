pub mod build;
pub mod clean;
pub mod config;
pub mod plan;
pub mod variants;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use wheelwright_core::{BuildConfig, BuildError};

use crate::cli::ConfigOverrides;

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct Session {
    /// Absolute project root.
    pub project_dir: PathBuf,
    /// Absolute path of an explicit manifest.
    pub manifest: Option<PathBuf>,
    pub debug: bool,
}

impl Session {
    pub fn new(project_dir: Option<&Path>, manifest: Option<&Path>, debug: bool) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let absolute = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                cwd.join(p)
            }
        };
        let project_dir = project_dir.map(absolute).unwrap_or_else(|| cwd.clone());
        if !project_dir.is_dir() {
            anyhow::bail!("Project directory not found: {}", project_dir.display());
        }
        Ok(Self {
            project_dir,
            manifest: manifest.map(absolute),
            debug,
        })
    }

    /// Defaults → manifest → environment → CLI flags, then validated.
    pub fn load_config(&self, overrides: &ConfigOverrides) -> Result<BuildConfig, BuildError> {
        let mut config = BuildConfig::load(&self.project_dir, self.manifest.as_deref())?;
        overrides.apply_to(&mut config);
        config.validate()?;
        tracing::debug!(
            "Config: image={} runtime={} tags={:?} packages={:?}",
            config.container_image,
            config.container_runtime,
            config.version_tags,
            config.system_packages
        );
        Ok(config)
    }
}
