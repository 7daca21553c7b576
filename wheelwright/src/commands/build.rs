//! `wheelwright build`: the orchestrator entry point.

use std::io::IsTerminal;

use anyhow::Result;
use wheelwright_core::{BuildConfig, BuildPlan, ExecutionContext};
use wheelwright_runner::orchestrator::{self, container_command};
use wheelwright_runner::{HostInvocation, Outcome, ProcessRunner};

use super::Session;
use crate::cli::BuildArgs;

pub fn cmd_build(session: &Session, args: &BuildArgs) -> Result<()> {
    let config = session.load_config(&args.overrides)?;
    let context = ExecutionContext::resolve(&config)?;
    let invocation = HostInvocation {
        tty: resolve_tty(&config, args.tty_override()),
        debug: session.debug,
    };

    if args.dry_run {
        return dry_run(context, &config, &invocation);
    }

    let mut runner = ProcessRunner::new();
    match orchestrator::run(context, &config, &mut runner, &invocation)? {
        Outcome::Delegated => {
            tracing::info!("Container build finished");
        }
        Outcome::Built(summary) => {
            for wheel in &summary.wheels {
                eprintln!("  • {}", wheel.display());
            }
            eprintln!(
                "✓ Built {} variant(s), {} wheel(s)",
                summary.variants.len(),
                summary.wheels.len()
            );
        }
    }
    Ok(())
}

/// CLI flag, then config, then "is stdin a terminal".
fn resolve_tty(config: &BuildConfig, cli: Option<bool>) -> bool {
    cli.or(config.tty)
        .unwrap_or_else(|| std::io::stdin().is_terminal())
}

fn dry_run(context: ExecutionContext, config: &BuildConfig, invocation: &HostInvocation) -> Result<()> {
    eprintln!("(Dry run, {} context: nothing is executed or removed.)", context);
    match context {
        ExecutionContext::Host => {
            println!("{}", container_command(config, invocation)?.command_line());
        }
        ExecutionContext::Container => {
            let variants = wheelwright_core::discover_variants(
                &config.interpreters_root,
                &config.implementation_prefix,
                &config.version_tags,
            )?;
            let plan = BuildPlan::for_variants(config, &variants)?;
            super::plan::print_plan(&plan);
        }
    }
    Ok(())
}
