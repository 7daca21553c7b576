//! Unified configuration layer.
//!
//! All environment reads are centralized here; the rest of the code works
//! with structured config instead of calling `std::env::var`.
//!
//! - `loader`: env_or, env_optional, env_bool, env_list helpers and `.env` loading
//! - `schema`: BuildConfig, Manifest, ObservabilityConfig
//! - `env_keys`: key constants and aliases

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{
    env_bool, env_list, env_list_allow_empty, env_optional, env_or, load_dotenv,
    remove_env_var, set_env_var,
};
pub use schema::{BuildConfig, Manifest, ObservabilityConfig, MANIFEST_FILE};
