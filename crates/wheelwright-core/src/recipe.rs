//! Build recipe: the ordered command table run inside the container.
//!
//! Each step is an argv template. Placeholders are substituted per variant:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{pip}` | `<variant>/bin/pip` |
//! | `{python}` | `<variant>/bin/python` |
//! | `{variant}` | variant directory |
//! | `{project}` | project root |
//! | `{wheel_dir}` | wheel output directory |
//! | `{artifacts}` | one argument per built wheel; must be a whole argument |
//!
//! Only `{name}` with a lowercase identifier is a placeholder. Any other brace
//! is literal, and `{{` / `}}` produce a single brace.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::BuildConfig;
use crate::error::RecipeError;
use crate::variant::Variant;

/// A named stage of the build, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Host side: the container runtime invocation.
    Container,
    SystemInstall,
    ToolchainUpgrade,
    ProjectInstall,
    Bdist,
    Repair,
}

/// Steps run for every variant, in order.
pub const VARIANT_STEPS: [Step; 4] = [
    Step::ToolchainUpgrade,
    Step::ProjectInstall,
    Step::Bdist,
    Step::Repair,
];

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::SystemInstall => "system-install",
            Self::ToolchainUpgrade => "toolchain-upgrade",
            Self::ProjectInstall => "project-install",
            Self::Bdist => "bdist",
            Self::Repair => "repair",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully expanded command, ready to hand to a runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering for logs and dry runs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quote `s` for a POSIX shell. Glob and brace characters are always quoted.
pub(crate) fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// The command table. Any field left out of a manifest keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRecipe {
    /// System package manager prefix; configured packages are appended.
    pub system_install: Vec<String>,
    pub toolchain_upgrade: Vec<String>,
    /// Appended to `toolchain_upgrade`.
    pub toolchain_packages: Vec<String>,
    pub project_install: Vec<String>,
    pub bdist: Vec<String>,
    pub repair: Vec<String>,
    /// Project-relative entries removed before each variant and after the loop.
    pub clean_patterns: Vec<String>,
    /// Where `bdist` leaves its wheels, relative to the project.
    pub dist_dir: String,
    /// Files in `dist_dir` handed to the repair step.
    pub artifact_glob: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for BuildRecipe {
    fn default() -> Self {
        Self {
            system_install: strings(&["yum", "-y", "install"]),
            toolchain_upgrade: strings(&["{pip}", "install", "-U"]),
            toolchain_packages: strings(&["pip", "setuptools", "cffi"]),
            project_install: strings(&["{pip}", "install", "."]),
            bdist: strings(&["{python}", "setup.py", "bdist_wheel"]),
            repair: strings(&["auditwheel", "repair", "-w", "{wheel_dir}", "{artifacts}"]),
            clean_patterns: strings(&["dist", "build", "*.egg-info"]),
            dist_dir: "dist".to_string(),
            artifact_glob: "*.whl".to_string(),
        }
    }
}

/// Values substituted into templates.
#[derive(Debug, Clone, Copy)]
pub struct ExpandContext<'a> {
    pub project_dir: &'a Path,
    pub wheel_dir: &'a Path,
    pub variant: Option<&'a Variant>,
    pub system_packages: &'a [String],
    pub artifacts: &'a [PathBuf],
}

impl BuildRecipe {
    /// Template and trailing arguments for `step`.
    fn template(&self, step: Step) -> (&[String], &[String]) {
        const NONE: &[String] = &[];
        match step {
            Step::Container => (NONE, NONE),
            Step::SystemInstall => (self.system_install.as_slice(), NONE),
            Step::ToolchainUpgrade => (
                self.toolchain_upgrade.as_slice(),
                self.toolchain_packages.as_slice(),
            ),
            Step::ProjectInstall => (self.project_install.as_slice(), NONE),
            Step::Bdist => (self.bdist.as_slice(), NONE),
            Step::Repair => (self.repair.as_slice(), NONE),
        }
    }

    /// Expand `step` into a runnable command with the project as working directory.
    pub fn expand(&self, step: Step, ctx: &ExpandContext<'_>) -> Result<CommandSpec, RecipeError> {
        let (template, trailing) = self.template(step);
        let mut argv: Vec<String> = Vec::with_capacity(template.len() + trailing.len());
        for token in template {
            argv.extend(expand_token(token, step, ctx)?);
        }
        argv.extend(trailing.iter().cloned());
        if step == Step::SystemInstall {
            argv.extend(ctx.system_packages.iter().cloned());
        }

        let mut argv = argv.into_iter();
        let program = argv.next().ok_or(RecipeError::EmptyCommand(step))?;
        Ok(CommandSpec::new(program)
            .args(argv)
            .current_dir(ctx.project_dir))
    }
}

fn expand_token(
    token: &str,
    step: Step,
    ctx: &ExpandContext<'_>,
) -> Result<Vec<String>, RecipeError> {
    if token == "{artifacts}" {
        return Ok(ctx
            .artifacts
            .iter()
            .map(|p| {
                p.strip_prefix(ctx.project_dir)
                    .unwrap_or(p)
                    .display()
                    .to_string()
            })
            .collect());
    }

    let mut out = String::with_capacity(token.len());
    let mut rest = token;
    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if let Some(name) = placeholder_name(tail) {
            out.push_str(&placeholder_value(name, step, ctx)?);
            rest = &tail[name.len() + 2..];
            continue;
        }
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }
    out.push_str(rest);
    Ok(vec![out])
}

/// `{ident}` at the start of `s`, where ident is `[a-z_]+`.
fn placeholder_name(s: &str) -> Option<&str> {
    let body = s.strip_prefix('{')?;
    let close = body.find('}')?;
    let name = &body[..close];
    (!name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c == '_')).then_some(name)
}

fn placeholder_value(name: &str, step: Step, ctx: &ExpandContext<'_>) -> Result<String, RecipeError> {
    let variant = || {
        ctx.variant.ok_or_else(|| RecipeError::NeedsVariant {
            step,
            placeholder: name.to_string(),
        })
    };
    let value = match name {
        "pip" => variant()?.pip(),
        "python" => variant()?.python(),
        "variant" => variant()?.dir.clone(),
        "project" => ctx.project_dir.to_path_buf(),
        "wheel_dir" => ctx.wheel_dir.to_path_buf(),
        _ => {
            return Err(RecipeError::UnknownPlaceholder {
                step,
                placeholder: name.to_string(),
            })
        }
    };
    Ok(value.display().to_string())
}

/// True when `pattern` names a direct child of the project: one normal path
/// component, so never empty, absolute, `.` or `..`.
pub fn is_child_pattern(pattern: &str) -> bool {
    let mut components = Path::new(pattern).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// One entry of a container-side build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanAction {
    /// Remove project-relative entries (glob patterns allowed).
    Remove { targets: Vec<String> },
    Run {
        step: Step,
        #[serde(skip_serializing_if = "Option::is_none")]
        variant: Option<String>,
        command: CommandSpec,
    },
}

/// The ordered sequence of actions a container run performs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildPlan {
    pub actions: Vec<PlanAction>,
}

impl BuildPlan {
    /// Plan for `variants`. Built wheels are not known ahead of time, so
    /// `{artifacts}` renders as the `<dist_dir>/<artifact_glob>` pattern.
    pub fn for_variants(config: &BuildConfig, variants: &[Variant]) -> Result<Self, RecipeError> {
        let recipe = &config.recipe;
        let wheel_glob = [PathBuf::from(&recipe.dist_dir).join(&recipe.artifact_glob)];
        let base = ExpandContext {
            project_dir: &config.project_dir,
            wheel_dir: &config.wheel_dir,
            variant: None,
            system_packages: &config.system_packages,
            artifacts: &wheel_glob,
        };

        let mut actions = Vec::new();
        if !config.system_packages.is_empty() {
            actions.push(PlanAction::Run {
                step: Step::SystemInstall,
                variant: None,
                command: recipe.expand(Step::SystemInstall, &base)?,
            });
        }
        actions.push(PlanAction::Remove {
            targets: vec![config.wheel_dir.display().to_string()],
        });
        for variant in variants {
            actions.push(PlanAction::Remove {
                targets: recipe.clean_patterns.clone(),
            });
            let ctx = ExpandContext {
                variant: Some(variant),
                ..base
            };
            for step in VARIANT_STEPS {
                actions.push(PlanAction::Run {
                    step,
                    variant: Some(variant.name.clone()),
                    command: recipe.expand(step, &ctx)?,
                });
            }
        }
        actions.push(PlanAction::Remove {
            targets: recipe.clean_patterns.clone(),
        });
        Ok(Self { actions })
    }

    /// Commands in execution order.
    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.actions.iter().filter_map(|a| match a {
            PlanAction::Run { command, .. } => Some(command),
            PlanAction::Remove { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant() -> Variant {
        Variant {
            tag: "36".to_string(),
            name: "cp36-cp36m".to_string(),
            dir: PathBuf::from("/opt/python/cp36-cp36m"),
        }
    }

    #[test]
    fn test_expand_defaults_for_variant() {
        let recipe = BuildRecipe::default();
        let v = variant();
        let artifacts = [
            PathBuf::from("/project/dist/a-1.0-cp36-cp36m-linux_x86_64.whl"),
            PathBuf::from("/project/dist/b-1.0-cp36-cp36m-linux_x86_64.whl"),
        ];
        let ctx = ExpandContext {
            project_dir: Path::new("/project"),
            wheel_dir: Path::new("wheelhouse"),
            variant: Some(&v),
            system_packages: &[],
            artifacts: &artifacts,
        };

        let upgrade = recipe.expand(Step::ToolchainUpgrade, &ctx).unwrap();
        assert_eq!(
            upgrade.command_line(),
            "/opt/python/cp36-cp36m/bin/pip install -U pip setuptools cffi"
        );
        assert_eq!(upgrade.cwd.as_deref(), Some(Path::new("/project")));

        let bdist = recipe.expand(Step::Bdist, &ctx).unwrap();
        assert_eq!(bdist.program, "/opt/python/cp36-cp36m/bin/python");
        assert_eq!(bdist.args, vec!["setup.py", "bdist_wheel"]);

        let repair = recipe.expand(Step::Repair, &ctx).unwrap();
        assert_eq!(
            repair.args,
            vec![
                "repair",
                "-w",
                "wheelhouse",
                "dist/a-1.0-cp36-cp36m-linux_x86_64.whl",
                "dist/b-1.0-cp36-cp36m-linux_x86_64.whl",
            ]
        );
    }

    #[test]
    fn test_expand_system_install_appends_packages() {
        let recipe = BuildRecipe::default();
        let packages = vec!["libffi-devel".to_string(), "mysql-devel".to_string()];
        let ctx = ExpandContext {
            project_dir: Path::new("/project"),
            wheel_dir: Path::new("wheelhouse"),
            variant: None,
            system_packages: &packages,
            artifacts: &[],
        };
        let cmd = recipe.expand(Step::SystemInstall, &ctx).unwrap();
        assert_eq!(cmd.command_line(), "yum -y install libffi-devel mysql-devel");
    }

    #[test]
    fn test_expand_errors() {
        let mut recipe = BuildRecipe::default();
        let ctx = ExpandContext {
            project_dir: Path::new("/project"),
            wheel_dir: Path::new("wheelhouse"),
            variant: None,
            system_packages: &[],
            artifacts: &[],
        };
        assert!(matches!(
            recipe.expand(Step::Bdist, &ctx),
            Err(RecipeError::NeedsVariant { .. })
        ));

        recipe.repair = strings(&["auditwheel", "repair", "--plat={platform}"]);
        assert!(matches!(
            recipe.expand(Step::Repair, &ctx),
            Err(RecipeError::UnknownPlaceholder { placeholder, .. }) if placeholder == "platform"
        ));

        recipe.project_install.clear();
        assert!(matches!(
            recipe.expand(Step::ProjectInstall, &ctx),
            Err(RecipeError::EmptyCommand(Step::ProjectInstall))
        ));
    }

    #[test]
    fn test_inline_placeholder_and_quoting() {
        let mut recipe = BuildRecipe::default();
        recipe.repair = strings(&["auditwheel", "repair", "--wheel-dir={wheel_dir}", "{artifacts}"]);
        let artifacts = [PathBuf::from("/p/dist/x y.whl")];
        let ctx = ExpandContext {
            project_dir: Path::new("/p"),
            wheel_dir: Path::new("out"),
            variant: None,
            system_packages: &[],
            artifacts: &artifacts,
        };
        let cmd = recipe.expand(Step::Repair, &ctx).unwrap();
        assert_eq!(cmd.command_line(), "auditwheel repair --wheel-dir=out 'dist/x y.whl'");
    }

    #[test]
    fn test_plan_for_two_variants() {
        let config = BuildConfig::defaults("/project");
        let second = Variant {
            tag: "27".to_string(),
            name: "cp27-cp27mu".to_string(),
            dir: PathBuf::from("/opt/python/cp27-cp27mu"),
        };
        let plan = BuildPlan::for_variants(&config, &[second, variant()]).unwrap();

        // install, wipe wheel dir, (clean + 4 steps) per variant, final clean
        assert_eq!(plan.actions.len(), 2 + 2 * 5 + 1);
        let lines: Vec<String> = plan.commands().map(CommandSpec::command_line).collect();
        assert_eq!(lines[0], "yum -y install libffi-devel");
        assert_eq!(lines[1], "/opt/python/cp27-cp27mu/bin/pip install -U pip setuptools cffi");
        assert_eq!(lines[4], "auditwheel repair -w wheelhouse 'dist/*.whl'");
        assert_eq!(lines.len(), 9);
        assert!(matches!(plan.actions.last(), Some(PlanAction::Remove { .. })));

        let mut bare = BuildConfig::defaults("/project");
        bare.system_packages.clear();
        let plan = BuildPlan::for_variants(&bare, &[variant()]).unwrap();
        assert!(plan.commands().all(|c| c.program != "yum"));
    }

    #[test]
    fn test_braces_outside_placeholders_are_literal() {
        let v = variant();
        let ctx = ExpandContext {
            project_dir: Path::new("/project"),
            wheel_dir: Path::new("wheelhouse"),
            variant: Some(&v),
            system_packages: &[],
            artifacts: &[],
        };
        let mut recipe = BuildRecipe::default();
        recipe.bdist = strings(&[
            "{python}",
            "-c",
            "print({})",
            "--config-settings={\"k\":1}",
            "{{python}}",
            "{Upper}",
        ]);
        let cmd = recipe.expand(Step::Bdist, &ctx).unwrap();
        assert_eq!(cmd.program, "/opt/python/cp36-cp36m/bin/python");
        assert_eq!(
            cmd.args,
            vec!["-c", "print({})", "--config-settings={\"k\":1}", "{python}", "{Upper}"]
        );
    }

    #[test]
    fn test_is_child_pattern() {
        assert!(is_child_pattern("dist"));
        assert!(is_child_pattern("*.egg*"));
        for bad in ["", ".", "..", "../x", "/tmp", "a/b"] {
            assert!(!is_child_pattern(bad), "{bad}");
        }
    }

    #[test]
    fn test_recipe_partial_yaml_keeps_defaults() {
        let recipe: BuildRecipe =
            serde_yaml::from_str("bdist: ['{python}', '-m', 'build', '--wheel']\n").unwrap();
        assert_eq!(recipe.bdist, strings(&["{python}", "-m", "build", "--wheel"]));
        assert_eq!(recipe.repair, BuildRecipe::default().repair);
    }
}
