//! `wheelwright clean`: remove build intermediates left in the project.
//!
//! Intermediates are the recipe's `clean_patterns` (`dist`, `build`,
//! `*.egg-info` by default). `--all` also drops the wheel output directory.

use std::path::Path;

use anyhow::Result;
use wheelwright_runner::cleanup;

use super::Session;
use crate::cli::ConfigOverrides;

pub fn cmd_clean(session: &Session, all: bool, dry_run: bool) -> Result<()> {
    let config = session.load_config(&ConfigOverrides::default())?;
    let project = &config.project_dir;

    let mut targets = cleanup::find_patterns(project, &config.recipe.clean_patterns)?;
    if all {
        let wheel_dir = config.wheel_dir_path();
        if wheel_dir.exists() {
            targets.push(wheel_dir);
        }
    }

    if targets.is_empty() {
        eprintln!("Nothing to clean in {}", project.display());
        return Ok(());
    }

    for path in &targets {
        eprintln!("  • {}", display_relative(path, project));
    }

    if dry_run {
        eprintln!();
        eprintln!("(Dry run: no files removed. Remove --dry-run to delete.)");
        return Ok(());
    }

    let removed = cleanup::remove_patterns(project, &config.recipe.clean_patterns)?;
    let mut count = removed.len();
    if all && cleanup::remove_dir_if_exists(&config.wheel_dir_path())? {
        count += 1;
    }
    eprintln!("✓ Removed {} path(s)", count);
    Ok(())
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
