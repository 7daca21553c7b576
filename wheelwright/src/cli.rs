//! CLI definition and argument parsing for wheelwright.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wheelwright_core::BuildConfig;

/// wheelwright - build portable manylinux wheels inside a build container
#[derive(Parser, Debug)]
#[command(name = "wheelwright")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Project root (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Manifest file (default: <project>/wheelwright.yaml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Defaults to `build` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build wheels: delegate to the container on the host, build inside it
    Build(BuildArgs),

    /// Print the commands a container run would execute
    Plan {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List interpreter variants selected by the version allow-list
    #[command(visible_alias = "ls")]
    Variants {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove build intermediates (dist, build, *.egg-info)
    Clean {
        /// Also remove the wheel output directory
        #[arg(long)]
        all: bool,

        /// Only list what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the resolved configuration as JSON
    Config {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Print what would run without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Always attach a TTY to the container
    #[arg(long, conflicts_with = "no_tty")]
    pub tty: bool,

    /// Never attach a TTY to the container
    #[arg(long)]
    pub no_tty: bool,
}

impl BuildArgs {
    /// `Some` when a TTY flag was given.
    pub fn tty_override(&self) -> Option<bool> {
        if self.tty {
            Some(true)
        } else if self.no_tty {
            Some(false)
        } else {
            None
        }
    }
}

/// Flags that override manifest and environment settings.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Container image
    #[arg(long, value_name = "IMAGE")]
    pub image: Option<String>,

    /// Container runtime binary (docker, podman)
    #[arg(long, value_name = "BIN")]
    pub runtime: Option<String>,

    /// Python version tags to build, comma separated (e.g. 27,36)
    #[arg(long, value_name = "TAGS", value_delimiter = ',')]
    pub python_versions: Option<Vec<String>>,

    /// System packages installed before building, comma separated
    #[arg(long, value_name = "PKGS", value_delimiter = ',')]
    pub system_packages: Option<Vec<String>>,

    /// Wheel output directory (relative to the project)
    #[arg(long, value_name = "DIR")]
    pub wheel_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn apply_to(&self, config: &mut BuildConfig) {
        if let Some(ref image) = self.image {
            config.container_image = image.clone();
        }
        if let Some(ref runtime) = self.runtime {
            config.container_runtime = runtime.clone();
        }
        if let Some(ref tags) = self.python_versions {
            config.version_tags = tags
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(ref packages) = self.system_packages {
            config.system_packages = packages
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(ref dir) = self.wheel_dir {
            config.wheel_dir = dir.clone();
        }
    }
}
