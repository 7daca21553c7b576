//! `wheelwright variants`: which interpreters the allow-list selects.

use anyhow::{Context, Result};
use serde_json::json;

use super::Session;
use crate::cli::ConfigOverrides;

pub fn cmd_variants(session: &Session, overrides: &ConfigOverrides, json: bool) -> Result<()> {
    let config = session.load_config(overrides)?;
    let variants = wheelwright_core::discover_variants(
        &config.interpreters_root,
        &config.implementation_prefix,
        &config.version_tags,
    )
    .map_err(wheelwright_core::BuildError::from)?;

    if json {
        let items: Vec<_> = variants
            .iter()
            .map(|v| {
                json!({
                    "tag": v.tag,
                    "name": v.name,
                    "dir": v.dir,
                    "python_version": v.python_version(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&items).context("Serialize variants")?
        );
        return Ok(());
    }

    if variants.is_empty() {
        eprintln!(
            "No interpreters under {} match tags {}",
            config.interpreters_root.display(),
            config.version_tags.join(",")
        );
        return Ok(());
    }
    for v in &variants {
        println!(
            "{:<16} {:<6} {}",
            v.name,
            v.python_version().unwrap_or_else(|| "?".to_string()),
            v.dir.display()
        );
    }
    Ok(())
}
