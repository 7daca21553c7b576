//! wheelwright CLI library, shared by the binary and its integration tests.

pub mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{BuildArgs, Cli, Commands};
use commands::Session;
use wheelwright_core::error::EXIT_USAGE;
use wheelwright_core::{BuildError, ConfigError, RecipeError, VariantError};

/// Parse arguments, set up tracing and dispatch.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    wheelwright_core::observability::init_tracing(cli.debug);
    run_with(cli)
}

/// Dispatch an already-parsed command line.
pub fn run_with(cli: Cli) -> Result<()> {
    let session = Session::new(cli.project_dir.as_deref(), cli.manifest.as_deref(), cli.debug)?;
    match cli.command.unwrap_or_else(|| Commands::Build(BuildArgs::default())) {
        Commands::Build(args) => commands::build::cmd_build(&session, &args),
        Commands::Plan { overrides, json } => commands::plan::cmd_plan(&session, &overrides, json),
        Commands::Variants { overrides, json } => {
            commands::variants::cmd_variants(&session, &overrides, json)
        }
        Commands::Clean { all, dry_run } => commands::clean::cmd_clean(&session, all, dry_run),
        Commands::Config { overrides } => commands::config::cmd_config(&session, &overrides),
    }
}

/// Process exit status for an error returned by [`run_cli`].
///
/// Build failures keep the failing child's code; configuration problems are
/// usage errors; everything else is 1.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<BuildError>() {
            return e.exit_code();
        }
        if cause.is::<ConfigError>() || cause.is::<VariantError>() || cause.is::<RecipeError>() {
            return EXIT_USAGE;
        }
    }
    1
}
