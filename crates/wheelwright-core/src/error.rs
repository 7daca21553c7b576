//! Error taxonomy.
//!
//! Every build failure ends up as a [`BuildError`], and every `BuildError`
//! maps to exactly one process exit code via [`BuildError::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

use crate::recipe::Step;

/// Exit code for configuration and usage problems.
pub const EXIT_USAGE: i32 = 2;
/// Shell convention: command not found.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Shell convention: found but could not be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

/// Errors while assembling [`crate::config::BuildConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no python version tags configured")]
    NoVersionTags,

    #[error("invalid python version tag '{0}' (expected letters, digits, '_' or '.')")]
    InvalidVersionTag(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("wheel dir '{0}' must be a relative path inside the project (no '.', '..' or absolute paths)")]
    UnsafeWheelDir(PathBuf),

    #[error("invalid glob '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },
}

/// Errors while enumerating interpreter installations.
#[derive(Debug, Error)]
pub enum VariantError {
    #[error("interpreters root not found: {0}")]
    RootMissing(PathBuf),

    #[error("failed to read interpreters root {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while expanding a command template.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("command template for step '{0}' is empty")]
    EmptyCommand(Step),

    #[error("unknown placeholder '{{{placeholder}}}' in step '{step}'")]
    UnknownPlaceholder { step: Step, placeholder: String },

    #[error("placeholder '{{{placeholder}}}' in step '{step}' needs an interpreter variant")]
    NeedsVariant { step: Step, placeholder: String },

    #[error("pattern '{0}' cannot be used in a shell script (allowed: letters, digits, '._-+@%,' and '*?[]')")]
    UnsafePattern(String),
}

/// Fail-fast build error. The first one raised aborts the run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("step '{step}' failed: {program} exited with status {code}")]
    CommandFailed {
        step: Step,
        program: String,
        code: i32,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bdist for {variant} produced no wheel in {dist}")]
    NoArtifacts { variant: String, dist: PathBuf },

    #[error("filesystem operation on {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Variant(#[from] VariantError),

    #[error(transparent)]
    Recipe(#[from] RecipeError),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure.
    ///
    /// A failing child propagates its own status; a child that could not be
    /// started uses the shell's 127/126.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code, .. } => {
                if *code == 0 {
                    1
                } else {
                    *code
                }
            }
            Self::Spawn { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => EXIT_NOT_FOUND,
                _ => EXIT_NOT_EXECUTABLE,
            },
            Self::NoArtifacts { .. } | Self::Io { .. } => 1,
            Self::Config(_) | Self::Variant(_) | Self::Recipe(_) => EXIT_USAGE,
        }
    }
}
