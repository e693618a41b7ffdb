//! Registry cache file model
//!
//! Mirrors the JSON written by the `crank` CLI. List-valued fields carry the
//! `List` suffix on the wire, and missing lists deserialize as empty.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cog: a named plugin contributing step definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CogDescriptor {
    pub name: String,
    #[serde(rename = "stepDefinitionsList", default)]
    pub step_definitions: Vec<StepDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    /// Regular expression matched case-insensitively against step phrasing
    pub expression: String,
    /// Unique within the owning cog
    pub step_id: String,
    #[serde(rename = "expectedFieldsList", default)]
    pub expected_fields: Vec<FieldSpec>,
    #[serde(rename = "expectedRecordsList", default)]
    pub expected_records: Vec<RecordSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Shape of data a step produces at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(rename = "guaranteedFieldsList", default)]
    pub guaranteed_fields: Vec<FieldSpec>,
    #[serde(default)]
    pub may_have_more_fields: bool,
}

/// Record kind, encoded on the wire as `0` (key/value) or `1` (table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RecordType {
    KeyValue,
    Table,
}

impl TryFrom<u8> for RecordType {
    type Error = UnknownRecordType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RecordType::KeyValue),
            1 => Ok(RecordType::Table),
            other => Err(UnknownRecordType(other)),
        }
    }
}

impl From<RecordType> for u8 {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::KeyValue => 0,
            RecordType::Table => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRecordType(pub u8);

impl fmt::Display for UnknownRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown record type {} (expected 0 or 1)", self.0)
    }
}
