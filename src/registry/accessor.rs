//! Memoized registry loading and the flattened step list

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::model::{CogDescriptor, StepDefinition};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read cog registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cog registry {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A step definition together with its owning cog's name and compiled pattern.
#[derive(Debug, Clone)]
pub struct StepEntry {
    pub cog: String,
    pub definition: StepDefinition,
    pattern: Option<Regex>,
}

impl StepEntry {
    pub fn new(cog: impl Into<String>, definition: StepDefinition) -> Self {
        let pattern = match RegexBuilder::new(&definition.expression)
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(
                    "Step expression for {} does not compile, matching verbatim only: {}",
                    definition.step_id, e
                );
                None
            }
        };

        Self {
            cog: cog.into(),
            definition,
            pattern,
        }
    }

    /// True when `phrasing` matches the expression or equals it verbatim.
    pub fn matches_phrasing(&self, phrasing: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(phrasing))
            || self.definition.expression == phrasing
    }

    pub fn step_id(&self) -> &str {
        &self.definition.step_id
    }

    pub fn expression(&self) -> &str {
        &self.definition.expression
    }
}

/// Concatenates every cog's step definitions in registry order.
pub fn flatten_steps(cogs: &[CogDescriptor]) -> Vec<StepEntry> {
    cogs.iter()
        .flat_map(|cog| {
            cog.step_definitions
                .iter()
                .map(move |definition| StepEntry::new(cog.name.clone(), definition.clone()))
        })
        .collect()
}

/// Immutable, loaded registry.
#[derive(Debug, Default)]
pub struct CogRegistry {
    cogs: Vec<CogDescriptor>,
    steps: Vec<StepEntry>,
}

impl CogRegistry {
    pub fn new(cogs: Vec<CogDescriptor>) -> Self {
        let steps = flatten_steps(&cogs);
        Self { cogs, steps }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Vec<CogDescriptor>>(json).map(Self::new)
    }

    pub fn cogs(&self) -> &[CogDescriptor] {
        &self.cogs
    }

    pub fn steps(&self) -> &[StepEntry] {
        &self.steps
    }

    pub fn step_expressions(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(StepEntry::expression)
    }

    /// First step, in registry order, whose expression matches `phrasing`.
    pub fn find_by_phrasing(&self, phrasing: &str) -> Option<&StepEntry> {
        self.steps.iter().find(|step| step.matches_phrasing(phrasing))
    }

    /// Step with exactly this cog name and step id.
    pub fn find_by_id(&self, cog: &str, step_id: &str) -> Option<&StepEntry> {
        self.steps
            .iter()
            .find(|step| step.cog == cog && step.definition.step_id == step_id)
    }

    pub fn is_empty(&self) -> bool {
        self.cogs.is_empty()
    }
}

/// Loads the registry file once and hands out the shared outcome afterwards.
///
/// A failed load is memoized as well: the registry stays unavailable for the
/// lifetime of the accessor and the file is never read again.
#[derive(Debug)]
pub struct RegistryAccessor {
    path: PathBuf,
    cache: OnceCell<Result<Arc<CogRegistry>, Arc<RegistryError>>>,
}

impl RegistryAccessor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    /// Accessor with an already-loaded registry, for embedding and tests.
    pub fn preloaded(registry: CogRegistry) -> Self {
        Self {
            path: PathBuf::new(),
            cache: OnceCell::with_value(Ok(Arc::new(registry))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Arc<CogRegistry>, Arc<RegistryError>> {
        self.cache
            .get_or_init(|| match read_registry(&self.path) {
                Ok(registry) => {
                    info!(
                        "Loaded cog registry from {:?}: {} cogs, {} steps",
                        self.path,
                        registry.cogs().len(),
                        registry.steps().len()
                    );
                    Ok(Arc::new(registry))
                }
                Err(e) => {
                    warn!("Cog registry unavailable, registry completions are disabled: {}", e);
                    Err(Arc::new(e))
                }
            })
            .clone()
    }

    /// Like [`load`](Self::load), yielding `None` once the load has failed.
    pub fn get(&self) -> Option<Arc<CogRegistry>> {
        self.load().ok()
    }
}

fn read_registry(path: &Path) -> Result<CogRegistry, RegistryError> {
    debug!("Reading cog registry from {:?}", path);
    let json = fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CogRegistry::from_json(&json).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })
}
