//! `wheelwright plan`: show the container-side command sequence.

use anyhow::{Context, Result};
use wheelwright_core::{BuildConfig, BuildPlan, PlanAction, Variant};

use super::Session;
use crate::cli::ConfigOverrides;

pub fn cmd_plan(session: &Session, overrides: &ConfigOverrides, json: bool) -> Result<()> {
    let config = session.load_config(overrides)?;
    let variants = planned_variants(&config)?;
    let plan = BuildPlan::for_variants(&config, &variants)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("Serialize plan")?
        );
    } else {
        print_plan(&plan);
    }
    Ok(())
}

/// Variants found under the interpreters root; on the host, where that root
/// usually does not exist, one placeholder per configured tag.
fn planned_variants(config: &BuildConfig) -> Result<Vec<Variant>> {
    if config.interpreters_root.is_dir() {
        return Ok(wheelwright_core::discover_variants(
            &config.interpreters_root,
            &config.implementation_prefix,
            &config.version_tags,
        )?);
    }
    tracing::info!(
        "{} not found; planning one entry per version tag",
        config.interpreters_root.display()
    );
    Ok(config
        .version_tags
        .iter()
        .map(|tag| {
            let name = format!("{}{}*", config.implementation_prefix, tag);
            Variant {
                tag: tag.clone(),
                dir: config.interpreters_root.join(&name),
                name,
            }
        })
        .collect())
}

pub fn print_plan(plan: &BuildPlan) {
    for (i, action) in plan.actions.iter().enumerate() {
        match action {
            PlanAction::Remove { targets } => {
                println!("{:>3}. rm -rf {}", i + 1, targets.join(" "));
            }
            PlanAction::Run { step, command, .. } => {
                println!("{:>3}. [{}] {}", i + 1, step, command.command_line());
            }
        }
    }
}
