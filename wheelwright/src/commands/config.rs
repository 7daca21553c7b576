//! `wheelwright config`: print the resolved configuration.

use anyhow::{Context, Result};
use serde_json::json;
use wheelwright_core::ExecutionContext;

use super::Session;
use crate::cli::ConfigOverrides;

pub fn cmd_config(session: &Session, overrides: &ConfigOverrides) -> Result<()> {
    let config = session.load_config(overrides)?;
    let context = ExecutionContext::resolve(&config)?;
    let out = json!({
        "context": context,
        "manifest": session.manifest,
        "config": config,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&out).context("Serialize config")?
    );
    Ok(())
}
