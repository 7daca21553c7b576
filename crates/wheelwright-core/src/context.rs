//! Where are we running: on the host, or inside the build container?

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::config::env_keys::container::WHEELWRIGHT_FORCE_CONTEXT;
use crate::config::{env_optional, BuildConfig};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionContext {
    /// Delegate to the container runtime.
    Host,
    /// Run the build steps directly.
    Container,
}

impl ExecutionContext {
    /// `Container` iff every marker directory exists.
    pub fn detect<P: AsRef<Path>>(markers: &[P]) -> Self {
        if !markers.is_empty() && markers.iter().all(|m| m.as_ref().is_dir()) {
            Self::Container
        } else {
            Self::Host
        }
    }

    /// Honour `WHEELWRIGHT_FORCE_CONTEXT`, otherwise detect from the
    /// configured markers.
    pub fn resolve(config: &BuildConfig) -> Result<Self, ConfigError> {
        if let Some(forced) = env_optional(WHEELWRIGHT_FORCE_CONTEXT, &[]) {
            let ctx = forced.parse()?;
            tracing::debug!("Execution context forced to {}", ctx);
            return Ok(ctx);
        }
        Ok(Self::detect(&config.container_markers()))
    }
}

impl FromStr for ExecutionContext {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "host" => Ok(Self::Host),
            "container" => Ok(Self::Container),
            _ => Err(ConfigError::InvalidValue {
                key: WHEELWRIGHT_FORCE_CONTEXT.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Host => "host",
            Self::Container => "container",
        })
    }
}
