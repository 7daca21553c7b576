//! Environment variable key constants and aliases.
//!
//! Primary keys use the `WHEELWRIGHT_*` prefix; a few generic aliases are
//! accepted for values people commonly already export in CI.

/// Container side of a build: image, runtime, paths inside the container.
pub mod container {
    pub const WHEELWRIGHT_IMAGE: &str = "WHEELWRIGHT_IMAGE";
    pub const IMAGE_ALIASES: &[&str] = &["MANYLINUX_IMAGE"];

    pub const WHEELWRIGHT_CONTAINER_RUNTIME: &str = "WHEELWRIGHT_CONTAINER_RUNTIME";
    pub const CONTAINER_RUNTIME_ALIASES: &[&str] = &["CONTAINER_RUNTIME"];

    pub const WHEELWRIGHT_MOUNT_PATH: &str = "WHEELWRIGHT_MOUNT_PATH";

    pub const WHEELWRIGHT_INTERPRETERS_ROOT: &str = "WHEELWRIGHT_INTERPRETERS_ROOT";

    /// Comma separated list of extra variable names passed into the container.
    pub const WHEELWRIGHT_FORWARD_ENV: &str = "WHEELWRIGHT_FORWARD_ENV";

    /// `host` or `container`; overrides marker detection.
    pub const WHEELWRIGHT_FORCE_CONTEXT: &str = "WHEELWRIGHT_FORCE_CONTEXT";

    /// Attach a TTY to the container run. Unset means "if stdin is a terminal".
    pub const WHEELWRIGHT_TTY: &str = "WHEELWRIGHT_TTY";
}

/// What gets built and where it lands.
pub mod build {
    /// Comma separated version tags, e.g. `27,36`.
    pub const WHEELWRIGHT_PYTHON_VERSIONS: &str = "WHEELWRIGHT_PYTHON_VERSIONS";
    pub const PYTHON_VERSIONS_ALIASES: &[&str] = &["PYTHON_VERSIONS"];

    pub const WHEELWRIGHT_IMPLEMENTATION: &str = "WHEELWRIGHT_IMPLEMENTATION";

    pub const WHEELWRIGHT_SYSTEM_PACKAGES: &str = "WHEELWRIGHT_SYSTEM_PACKAGES";

    pub const WHEELWRIGHT_WHEEL_DIR: &str = "WHEELWRIGHT_WHEEL_DIR";
}

/// Logging.
pub mod observability {
    pub const WHEELWRIGHT_QUIET: &str = "WHEELWRIGHT_QUIET";

    pub const WHEELWRIGHT_LOG_LEVEL: &str = "WHEELWRIGHT_LOG_LEVEL";

    pub const WHEELWRIGHT_LOG_JSON: &str = "WHEELWRIGHT_LOG_JSON";
}

/// Flags set on every child process: unbuffered output, no `.pyc` writes.
pub const PYTHON_CHILD_ENV: &[(&str, &str)] = &[
    ("PYTHONUNBUFFERED", "1"),
    ("PYTHONDONTWRITEBYTECODE", "1"),
];
