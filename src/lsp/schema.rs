//! JSON schema contribution for YAML tooling
//!
//! YAML language servers accept schema contributors: a resolver mapping a
//! resource to a schema URI, and a resolver mapping that URI to the schema
//! text. Scenario files get the bundled scenario schema under the virtual
//! `crankscenarioyml://` scheme.

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

pub const SCHEMA_NAME: &str = "crankscenarioyml";
pub const SCHEMA_URI: &str = "crankscenarioyml://schema/crank-scenario";
pub const SCENARIO_EXTENSIONS: [&str; 2] = [".crank.yml", ".crank.yaml"];

const SCENARIO_SCHEMA: &str = include_str!("../../schema/scenario-schema.json");

pub type UriResolver = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;
pub type ContentResolver = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("no YAML schema support is available; scenario files will not be validated")]
    NoHost,
}

pub fn is_scenario_resource(resource: &str) -> bool {
    SCENARIO_EXTENSIONS.iter().any(|ext| resource.ends_with(ext))
}

/// Schema URI for scenario files, `None` for anything else.
pub fn schema_uri(resource: &str) -> Option<String> {
    is_scenario_resource(resource).then(|| SCHEMA_URI.to_string())
}

/// The scenario schema for URIs under the contributor's scheme.
pub fn schema_content(uri: &str) -> Option<&'static str> {
    let parsed = Url::parse(uri).ok()?;
    if parsed.scheme() != SCHEMA_NAME {
        return None;
    }
    if !parsed.path().starts_with('/') {
        return None;
    }
    Some(SCENARIO_SCHEMA)
}

/// Something schema contributors can register with.
pub trait YamlSchemaHost {
    fn register_contributor(&mut self, schema: &str, uri_resolver: UriResolver, content_resolver: ContentResolver);
}

struct Contributor {
    schema: String,
    uri_resolver: UriResolver,
    content_resolver: ContentResolver,
}

/// In-process schema host answering the server's schema requests.
#[derive(Default)]
pub struct SchemaRegistry {
    contributors: Vec<Contributor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &str> {
        self.contributors.iter().map(|c| c.schema.as_str())
    }

    /// First contributed schema URI for `resource`.
    pub fn schema_uri_for(&self, resource: &str) -> Option<String> {
        self.contributors.iter().find_map(|c| (c.uri_resolver)(resource))
    }

    pub fn schema_content_for(&self, uri: &str) -> Option<String> {
        self.contributors.iter().find_map(|c| (c.content_resolver)(uri))
    }
}

impl YamlSchemaHost for SchemaRegistry {
    fn register_contributor(&mut self, schema: &str, uri_resolver: UriResolver, content_resolver: ContentResolver) {
        debug!("Registering schema contributor {}", schema);
        self.contributors.retain(|c| c.schema != schema);
        self.contributors.push(Contributor {
            schema: schema.to_string(),
            uri_resolver,
            content_resolver,
        });
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.schemas().collect::<Vec<_>>())
            .finish()
    }
}

/// Registers the scenario schema with `host`, if there is one.
pub fn register_scenario_schema(host: Option<&mut dyn YamlSchemaHost>) -> Result<(), SchemaError> {
    let host = host.ok_or(SchemaError::NoHost)?;
    host.register_contributor(
        SCHEMA_NAME,
        Box::new(schema_uri),
        Box::new(|uri: &str| schema_content(uri).map(str::to_string)),
    );
    info!("Registered {} schema contributor", SCHEMA_NAME);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_uri_for_scenario_files() {
        assert_eq!(schema_uri("file:///a/login.crank.yml").as_deref(), Some(SCHEMA_URI));
        assert_eq!(schema_uri("/a/login.crank.yaml").as_deref(), Some(SCHEMA_URI));
        assert_eq!(schema_uri("/a/login.yml"), None);
        assert_eq!(schema_uri("/a/login.crank.yml.bak"), None);
    }

    #[test]
    fn test_schema_content_gate() {
        assert!(schema_content(SCHEMA_URI).is_some());
        assert!(schema_content("crankscenarioyml://schema/anything").is_some());
        assert!(schema_content("https://schema/crank-scenario").is_none());
        assert!(schema_content("crankscenarioyml:crank-scenario").is_none());
        assert!(schema_content("not a uri").is_none());
    }

    #[test]
    fn test_bundled_schema_is_json() {
        let schema: serde_json::Value = serde_json::from_str(SCENARIO_SCHEMA).unwrap();
        assert!(schema["properties"]["steps"].is_object());
    }

    #[test]
    fn test_registration() {
        let mut registry = SchemaRegistry::new();
        register_scenario_schema(Some(&mut registry as &mut dyn YamlSchemaHost)).unwrap();
        register_scenario_schema(Some(&mut registry as &mut dyn YamlSchemaHost)).unwrap();
        assert_eq!(registry.schemas().collect::<Vec<_>>(), vec![SCHEMA_NAME]);
        let uri = registry.schema_uri_for("x.crank.yml").unwrap();
        assert!(registry.schema_content_for(&uri).is_some());

        assert_eq!(register_scenario_schema(None), Err(SchemaError::NoHost));
    }
}
