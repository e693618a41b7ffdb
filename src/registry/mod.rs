//! Cog registry access
//!
//! The registry is a JSON file written by the `crank` CLI into its cache
//! directory. It lists every installed cog together with the steps it
//! provides and the records those steps produce. This module provides:
//! - Strongly typed deserialization of the cache file
//! - Platform-specific resolution of the cache path
//! - A memoized accessor with a flattened, pattern-compiled step list

pub mod accessor;
pub mod model;
pub mod paths;

pub use accessor::{CogRegistry, RegistryAccessor, RegistryError, StepEntry, flatten_steps};
pub use model::{CogDescriptor, FieldSpec, RecordSpec, RecordType, StepDefinition};
pub use paths::{Platform, REGISTRY_FILE_NAME, cache_directory, default_registry_path, home_dir};
