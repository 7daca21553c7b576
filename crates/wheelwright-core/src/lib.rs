//! wheelwright core: configuration, execution context, interpreter variants,
//! the build recipe and the error taxonomy shared by the runner and the CLI.

pub mod config;
pub mod context;
pub mod error;
pub mod observability;
pub mod recipe;
pub mod script;
pub mod variant;

pub use config::BuildConfig;
pub use context::ExecutionContext;
pub use error::{BuildError, ConfigError, RecipeError, VariantError};
pub use recipe::{
    is_child_pattern, BuildPlan, BuildRecipe, CommandSpec, ExpandContext, PlanAction, Step,
};
pub use script::container_script;
pub use variant::{discover_variants, Variant};
