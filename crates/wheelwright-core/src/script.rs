//! The container-side build rendered as a POSIX `sh` script.
//!
//! The host hands this to the container runtime as `sh -c <script>`, so the
//! image only needs a shell, the interpreters and the repair tool. `set -e`
//! keeps the fail-fast contract: the first failing command ends the
//! container with its exit status, which the runtime passes back.

use std::path::PathBuf;

use crate::config::BuildConfig;
use crate::error::{BuildError, RecipeError};
use crate::recipe::{
    is_child_pattern, shell_quote, CommandSpec, ExpandContext, Step, VARIANT_STEPS,
};
use crate::variant::Variant;

// Stand-ins expanded by the recipe and rewritten into shell variables.
const VARIANT_MARK: &str = "\u{1}variant\u{1}";
const ARTIFACTS_MARK: &str = "\u{1}artifacts\u{1}";

/// Render the whole container run: system install, wheel dir reset, the
/// per-variant loop over `<interpreters_root>/<prefix><tag>*` and the final
/// cleanup. `trace` adds `set -x`.
pub fn container_script(config: &BuildConfig, trace: bool) -> Result<String, BuildError> {
    config.check_wheel_dir()?;
    let recipe = &config.recipe;

    let marker = Variant {
        tag: String::new(),
        name: VARIANT_MARK.to_string(),
        dir: PathBuf::from(VARIANT_MARK),
    };
    let artifacts = [PathBuf::from(ARTIFACTS_MARK)];
    let base = ExpandContext {
        project_dir: &config.mount_path,
        wheel_dir: &config.wheel_dir,
        variant: None,
        system_packages: &config.system_packages,
        artifacts: &artifacts,
    };
    let clean = clean_command(&recipe.clean_patterns)?;
    let root = shell_quote(&config.interpreters_root.display().to_string());

    let mut lines = vec!["set -e".to_string()];
    if trace {
        lines.push("set -x".to_string());
    }
    lines.push(format!(
        "cd {}",
        shell_quote(&config.mount_path.display().to_string())
    ));
    if !config.system_packages.is_empty() {
        lines.push(render(&recipe.expand(Step::SystemInstall, &base)?));
    }
    lines.push(format!(
        "rm -rf -- {}",
        shell_quote(&config.wheel_dir.display().to_string())
    ));
    lines.push(format!(
        "[ -d {root} ] || {{ echo \"wheelwright: interpreters root not found: \"{root} >&2; exit 2; }}"
    ));

    let globs: Vec<String> = config
        .version_tags
        .iter()
        .map(|tag| {
            let stem = format!("{}{}", config.implementation_prefix, tag);
            format!("{root}/{}*", shell_quote(&stem))
        })
        .collect();
    lines.push("seen=' '".to_string());
    lines.push(format!("for variant in {}; do", globs.join(" ")));
    lines.push(
        "  [ -d \"$variant\" ] || { echo \"wheelwright: no interpreter matching $variant, skipping\" >&2; continue; }"
            .to_string(),
    );
    lines.push("  case \"$seen\" in *\" $variant \"*) continue ;; esac".to_string());
    lines.push("  seen=\"$seen$variant \"".to_string());
    lines.push("  echo \"wheelwright: building wheel for $variant\" >&2".to_string());
    if let Some(ref clean) = clean {
        lines.push(format!("  {clean}"));
    }

    let ctx = ExpandContext {
        variant: Some(&marker),
        ..base
    };
    for step in VARIANT_STEPS {
        if step == Step::Repair {
            let dist = shell_quote(&recipe.dist_dir);
            let glob = shell_glob(&recipe.artifact_glob)?;
            lines.push(format!("  set -- {dist}/{glob}"));
            lines.push(format!(
                "  [ -e \"$1\" ] || {{ echo \"wheelwright: bdist produced no wheel in \"{dist} >&2; exit 1; }}"
            ));
        }
        lines.push(format!("  {}", render(&recipe.expand(step, &ctx)?)));
    }
    lines.push("done".to_string());
    if let Some(clean) = clean {
        lines.push(clean);
    }

    let mut script = lines.join("\n");
    script.push('\n');
    Ok(script)
}

fn render(spec: &CommandSpec) -> String {
    std::iter::once(&spec.program)
        .chain(&spec.args)
        .map(|word| render_word(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_word(word: &str) -> String {
    if word == ARTIFACTS_MARK {
        return "\"$@\"".to_string();
    }
    if !word.contains(VARIANT_MARK) {
        return shell_quote(word);
    }
    word.split(VARIANT_MARK)
        .map(|part| {
            if part.is_empty() {
                String::new()
            } else {
                shell_quote(part)
            }
        })
        .collect::<Vec<_>>()
        .join("\"$variant\"")
}

/// `rm -rf -- <patterns>`, globs left for the shell to expand.
fn clean_command(patterns: &[String]) -> Result<Option<String>, RecipeError> {
    let mut words = Vec::new();
    for pattern in patterns {
        if !is_child_pattern(pattern) {
            tracing::warn!(
                "Ignoring clean pattern '{}' (must name an entry inside the project)",
                pattern
            );
            continue;
        }
        if pattern.contains(['*', '?', '[']) {
            words.push(shell_glob(pattern)?);
        } else {
            words.push(shell_quote(pattern));
        }
    }
    Ok((!words.is_empty()).then(|| format!("rm -rf -- {}", words.join(" "))))
}

/// A glob that can go into the script unquoted.
fn shell_glob(pattern: &str) -> Result<String, RecipeError> {
    let safe = is_child_pattern(pattern)
        && pattern
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._-+@%,*?[]".contains(c));
    if safe {
        Ok(pattern.to_string())
    } else {
        Err(RecipeError::UnsafePattern(pattern.to_string()))
    }
}
