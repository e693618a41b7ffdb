//! Server configuration
//!
//! Sources, highest precedence first: command line flags, environment
//! variables, built-in defaults. The client's initialization options only
//! describe the client itself (e.g. whether it can host a YAML schema).

use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

use crate::lsp::command::DEFAULT_RUNNER;
use crate::registry::default_registry_path;

pub const REGISTRY_PATH_ENV: &str = "CRANK_REGISTRY_PATH";
pub const RUNNER_ENV: &str = "CRANK_RUNNER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// The cog registry cache file
    pub registry_path: PathBuf,
    /// Command prefixed to `run <path>` by the run-scenario command
    pub runner: String,
}

impl ServerConfig {
    pub fn resolve(
        registry_path: Option<PathBuf>,
        runner: Option<String>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Self {
        let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        Self {
            registry_path: registry_path
                .or_else(|| var(REGISTRY_PATH_ENV).map(PathBuf::from))
                .unwrap_or_else(default_registry_path),
            runner: runner
                .or_else(|| var(RUNNER_ENV))
                .unwrap_or_else(|| DEFAULT_RUNNER.to_string()),
        }
    }

    /// Resolves against the process environment.
    pub fn from_env(registry_path: Option<PathBuf>, runner: Option<String>) -> Self {
        Self::resolve(registry_path, runner, &|key: &str| std::env::var(key).ok())
    }
}

/// `initializationOptions` sent by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationOptions {
    /// Whether the client runs a YAML language service that accepts schema
    /// contributors. Assumed when absent.
    pub yaml_schema_support: Option<bool>,
}

impl InitializationOptions {
    pub fn from_value(value: Option<serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => Self::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("Ignoring malformed initialization options: {}", e);
                Self::default()
            }),
        }
    }

    pub fn yaml_schema_support(&self) -> bool {
        self.yaml_schema_support.unwrap_or(true)
    }
}
