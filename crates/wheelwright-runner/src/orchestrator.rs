//! Build orchestrator.
//!
//! On the host, hand the build to the container runtime as a `sh -c` script
//! run inside the image. Inside the container, install the system
//! dependency and build + repair a wheel for every interpreter variant.
//! Fail-fast throughout: the first failing step ends the run with that
//! step's exit code, leaving wheels of the variants already processed in
//! place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use wheelwright_core::config::env_keys;
use wheelwright_core::config::env_optional;
use wheelwright_core::recipe::VARIANT_STEPS;
use wheelwright_core::{
    container_script, discover_variants, BuildConfig, BuildError, CommandSpec, ExecutionContext,
    ExpandContext, Step,
};

use crate::cleanup;
use crate::runner::{run_checked, CommandRunner};

/// How the host side starts the container.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostInvocation {
    /// Attach a TTY (`-ti`) instead of plain `-i`.
    pub tty: bool,
    /// Trace the container script (`set -x`).
    pub debug: bool,
}

/// Result of a container-side build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Variant directory names, in build order.
    pub variants: Vec<String>,
    /// Repaired wheels in the output directory after the run.
    pub wheels: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The host delegated to the container and it finished successfully.
    Delegated,
    Built(BuildSummary),
}

/// Dispatch on the execution context.
pub fn run<R: CommandRunner + ?Sized>(
    context: ExecutionContext,
    config: &BuildConfig,
    runner: &mut R,
    invocation: &HostInvocation,
) -> Result<Outcome, BuildError> {
    tracing::info!("Execution context: {}", context);
    match context {
        ExecutionContext::Host => {
            delegate_to_container(config, runner, invocation)?;
            Ok(Outcome::Delegated)
        }
        ExecutionContext::Container => build_in_container(config, runner).map(Outcome::Built),
    }
}

/// Variables passed into the container with `-e`: the child-process Python
/// flags plus every `forward_env` name set on the host.
pub fn forwarded_env(config: &BuildConfig) -> Vec<(String, String)> {
    let mut vars: BTreeMap<String, String> = BTreeMap::new();
    for (k, v) in env_keys::PYTHON_CHILD_ENV {
        vars.insert(k.to_string(), v.to_string());
    }
    for name in &config.forward_env {
        match env_optional(name, &[]) {
            Some(value) => {
                vars.insert(name.clone(), value);
            }
            None => tracing::warn!(
                "Environment variable '{}' not found on host, skipping",
                name
            ),
        }
    }
    vars.into_iter().collect()
}

/// `<runtime> run --rm -ti|-i -v <project>:<mount> -w <mount> -e ... <image> sh -c <script>`
pub fn container_command(
    config: &BuildConfig,
    invocation: &HostInvocation,
) -> Result<CommandSpec, BuildError> {
    let script = container_script(config, invocation.debug)?;
    let mount = config.mount_path.display().to_string();
    let mut cmd = CommandSpec::new(config.container_runtime.clone())
        .arg("run")
        .arg("--rm")
        .arg(if invocation.tty { "-ti" } else { "-i" })
        .arg("-v")
        .arg(format!("{}:{}", config.project_dir.display(), mount))
        .arg("-w")
        .arg(mount);
    for (k, v) in forwarded_env(config) {
        cmd = cmd.arg("-e").arg(format!("{k}={v}"));
    }
    Ok(cmd
        .arg(config.container_image.clone())
        .args(["sh", "-c"])
        .arg(script)
        .current_dir(&config.project_dir))
}

/// Host branch: run the build inside the container and propagate its exit status.
///
/// Never runs install/build/repair steps on the host.
pub fn delegate_to_container<R: CommandRunner + ?Sized>(
    config: &BuildConfig,
    runner: &mut R,
    invocation: &HostInvocation,
) -> Result<(), BuildError> {
    let Some(runtime) = runner.locate(&config.container_runtime) else {
        return Err(BuildError::Spawn {
            program: config.container_runtime.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "container runtime not found on PATH",
            ),
        });
    };
    tracing::info!(
        "Delegating to {} ({}) with image {}",
        config.container_runtime,
        runtime.display(),
        config.container_image
    );
    let cmd = container_command(config, invocation)?;
    run_checked(runner, Step::Container, &cmd)
}

/// Container branch: system install, then toolchain upgrade, project
/// install, bdist and repair for each variant in allow-list order.
pub fn build_in_container<R: CommandRunner + ?Sized>(
    config: &BuildConfig,
    runner: &mut R,
) -> Result<BuildSummary, BuildError> {
    config.check_wheel_dir()?;
    let project = config.project_dir.as_path();
    let recipe = &config.recipe;
    let wheel_dir = config.wheel_dir_path();

    let variants = discover_variants(
        &config.interpreters_root,
        &config.implementation_prefix,
        &config.version_tags,
    )?;
    if variants.is_empty() {
        tracing::warn!(
            "No interpreter under {} matches {}{{{}}}*",
            config.interpreters_root.display(),
            config.implementation_prefix,
            config.version_tags.join(",")
        );
    }

    let base = ExpandContext {
        project_dir: project,
        wheel_dir: &config.wheel_dir,
        variant: None,
        system_packages: &config.system_packages,
        artifacts: &[],
    };

    if config.system_packages.is_empty() {
        tracing::info!("No system packages configured, skipping {}", Step::SystemInstall);
    } else {
        let cmd = recipe.expand(Step::SystemInstall, &base)?;
        run_checked(runner, Step::SystemInstall, &cmd)?;
    }

    cleanup::remove_dir_if_exists(&wheel_dir)?;

    let mut built = Vec::with_capacity(variants.len());
    for (i, variant) in variants.iter().enumerate() {
        tracing::info!(
            "[{}/{}] Building wheel for {} ({})",
            i + 1,
            variants.len(),
            variant.name,
            variant.python_version().unwrap_or_else(|| variant.tag.clone())
        );
        clean_intermediates(project, &recipe.clean_patterns)?;

        let ctx = ExpandContext {
            variant: Some(variant),
            ..base
        };
        for step in VARIANT_STEPS {
            let artifacts;
            let ctx = if step == Step::Repair {
                let dist = project.join(&recipe.dist_dir);
                artifacts = cleanup::list_matching(&dist, &recipe.artifact_glob)?;
                if artifacts.is_empty() {
                    return Err(BuildError::NoArtifacts {
                        variant: variant.name.clone(),
                        dist,
                    });
                }
                ExpandContext {
                    artifacts: &artifacts,
                    ..ctx
                }
            } else {
                ctx
            };
            let cmd = recipe.expand(step, &ctx)?;
            run_checked(runner, step, &cmd)?;
        }
        built.push(variant.name.clone());
    }

    clean_intermediates(project, &recipe.clean_patterns)?;

    let wheels = cleanup::list_matching(&wheel_dir, &recipe.artifact_glob)?;
    tracing::info!(
        "Built {} variant(s); {} wheel(s) in {}",
        built.len(),
        wheels.len(),
        wheel_dir.display()
    );
    Ok(BuildSummary {
        variants: built,
        wheels,
    })
}

fn clean_intermediates(project: &Path, patterns: &[String]) -> Result<(), BuildError> {
    let removed = cleanup::remove_patterns(project, patterns)?;
    if !removed.is_empty() {
        tracing::debug!("Removed {} intermediate path(s)", removed.len());
    }
    Ok(())
}
