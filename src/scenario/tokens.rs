//! Token table: static `tokens` declarations plus tokens derived from the
//! records of earlier steps

use std::collections::BTreeMap;

use serde_yaml::Value;
use tracing::debug;

use crate::registry::{RecordSpec, RecordType, StepEntry};

/// Where a token comes from. Only the key is substituted; the origin is shown
/// to the user as completion detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOrigin {
    /// Declared in the scenario's `tokens` mapping
    Static { value: String },
    /// Produced by a record of an earlier step
    Record { cog: String, record: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTable {
    entries: BTreeMap<String, TokenOrigin>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, origin: TokenOrigin) {
        self.entries.insert(key.into(), origin);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenOrigin)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds the top-level keys of the document's `tokens` mapping.
    ///
    /// Documents that do not parse contribute nothing.
    pub fn add_static_tokens(&mut self, document: &str) {
        let root: Value = match serde_yaml::from_str(document) {
            Ok(root) => root,
            Err(e) => {
                debug!("Skipping static tokens, document does not parse: {}", e);
                return;
            }
        };
        let Some(tokens) = root.get("tokens").and_then(Value::as_mapping) else {
            return;
        };
        for (key, value) in tokens {
            let Some(key) = scalar_to_string(key) else {
                continue;
            };
            let value = scalar_to_string(value).unwrap_or_default();
            self.insert(key, TokenOrigin::Static { value });
        }
    }

    /// Adds the tokens every record of `step` makes available.
    pub fn add_step_records(&mut self, step: &StepEntry) {
        let short = cog_short_name(&step.cog);
        for record in &step.definition.expected_records {
            for key in record_token_keys(short, record) {
                self.insert(
                    key,
                    TokenOrigin::Record {
                        cog: step.cog.clone(),
                        record: record.id.clone(),
                    },
                );
            }
        }
    }
}

/// Second `/` segment of a namespaced cog name, e.g. `web` for `acme/web`.
/// Names without a namespace are used whole.
pub fn cog_short_name(cog: &str) -> &str {
    cog.split('/').nth(1).unwrap_or(cog)
}

/// Token keys for one record.
///
/// Key/value records produce `<cog>.<record>.<field>`, table records address
/// their first row as `<cog>.<record>.1.<field>`. Records that may carry more
/// fields add a lower-cased `.*` wildcard.
pub fn record_token_keys(cog_short: &str, record: &RecordSpec) -> Vec<String> {
    let prefix = match record.record_type {
        RecordType::KeyValue => format!("{}.{}", cog_short, record.id),
        RecordType::Table => format!("{}.{}.1", cog_short, record.id),
    };

    let mut keys: Vec<String> = record
        .guaranteed_fields
        .iter()
        .map(|field| format!("{}.{}", prefix, field.key))
        .collect();

    if record.may_have_more_fields {
        keys.push(format!("{}.*", prefix).to_lowercase());
    }

    keys
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => serde_yaml::to_string(other).ok().map(|s| s.trim_end().to_string()),
    }
}
