//! The identifying keys of a single `steps` item and their registry lookup

use serde_yaml::Value;

use crate::registry::{CogRegistry, StepEntry};

/// Keys of a step item that select a registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepObject {
    /// Free-text phrasing matched against step expressions
    pub step: Option<String>,
    pub cog: Option<String>,
    pub step_id: Option<String>,
}

impl StepObject {
    /// Reads the keys from a parsed item. Non-mapping items yield `None`;
    /// non-string and empty values are treated as absent.
    pub fn from_yaml(value: &Value) -> Option<Self> {
        let mapping = value.as_mapping()?;
        let field = |key: &str| {
            mapping
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            step: field("step"),
            cog: field("cog"),
            step_id: field("stepId"),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.step.is_none() && self.cog.is_none() && self.step_id.is_none()
    }

    /// Phrasing wins over an explicit cog/step id pair.
    pub fn resolve<'r>(&self, registry: &'r CogRegistry) -> Option<&'r StepEntry> {
        if let Some(phrasing) = &self.step {
            return registry.find_by_phrasing(phrasing);
        }
        match (&self.cog, &self.step_id) {
            (Some(cog), Some(step_id)) => registry.find_by_id(cog, step_id),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, key: StepKey, value: String) {
        let slot = match key {
            StepKey::Step => &mut self.step,
            StepKey::Cog => &mut self.cog,
            StepKey::StepId => &mut self.step_id,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepKey {
    Step,
    Cog,
    StepId,
}

/// Splits a list item marker off `content` (text after indentation).
///
/// Returns the remainder and its offset in chars from the start of `content`.
pub(crate) fn strip_item_marker(content: &str) -> Option<(&str, usize)> {
    let rest = content.strip_prefix('-')?;
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }
    let trimmed = rest.trim_start();
    let offset = 1 + rest.chars().count() - trimmed.chars().count();
    Some((trimmed, offset))
}

/// Parses `step: ...`, `cog: ...` or `stepId: ...` from text that starts at a
/// mapping key. An empty value parses as `None`.
pub(crate) fn parse_key_line(text: &str) -> Option<(StepKey, Option<String>)> {
    let (key, raw) = text.split_once(':')?;
    let key = match key {
        "step" => StepKey::Step,
        "cog" => StepKey::Cog,
        "stepId" => StepKey::StepId,
        _ => return None,
    };
    if !(raw.is_empty() || raw.starts_with(char::is_whitespace)) {
        return None;
    }
    Some((key, scalar_value(raw)))
}

fn scalar_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::String(s)) if !s.is_empty() => Some(s),
        Ok(Value::String(_) | Value::Null | Value::Bool(_) | Value::Number(_)) => None,
        // Half-typed values such as an unterminated quote, or a stray `: `
        _ => {
            let plain = raw.split(" #").next().unwrap_or(raw).trim();
            (!plain.is_empty()).then(|| plain.to_string())
        }
    }
}
