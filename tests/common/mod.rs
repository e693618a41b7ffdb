#![allow(dead_code)]

pub mod client;

use std::path::PathBuf;

use crank_scenario_language_server::registry::CogRegistry;

/// A small registry in the on-disk cache format.
pub const REGISTRY_JSON: &str = r#"[
  {
    "name": "automatoninc/web",
    "version": "0.4.1",
    "stepDefinitionsList": [
      {
        "stepId": "NavigateToPage",
        "type": 0,
        "expression": "navigate to (?<webPageUrl>.+)",
        "expectedFieldsList": [
          { "key": "webPageUrl", "type": 1, "description": "Absolute URL of the page", "optionality": 1 }
        ],
        "expectedRecordsList": []
      },
      {
        "stepId": "EnterValueIntoField",
        "expression": "fill out (?<domQuerySelector>.+) with (?<value>.+)",
        "expectedFieldsList": [
          { "key": "domQuerySelector", "description": "CSS selector of the field" },
          { "key": "value" }
        ],
        "expectedRecordsList": [
          {
            "id": "form",
            "type": 0,
            "guaranteedFieldsList": [{ "key": "selector" }, { "key": "Value" }],
            "mayHaveMoreFields": false
          }
        ]
      }
    ]
  },
  {
    "name": "some/cog-name",
    "stepDefinitionsList": [
      {
        "stepId": "Do",
        "expression": "^I do (.*)$",
        "expectedFieldsList": [{ "key": "target" }],
        "expectedRecordsList": [
          {
            "id": "rec",
            "type": 0,
            "guaranteedFieldsList": [{ "key": "out" }],
            "mayHaveMoreFields": true
          }
        ]
      },
      {
        "stepId": "ListUsers",
        "expression": "list users in (.+)",
        "expectedFieldsList": [{ "key": "group" }],
        "expectedRecordsList": [
          {
            "id": "Users",
            "type": 1,
            "guaranteedFieldsList": [{ "key": "Name" }, { "key": "email" }],
            "mayHaveMoreFields": true
          }
        ]
      }
    ]
  }
]"#;

pub fn registry() -> CogRegistry {
    CogRegistry::from_json(REGISTRY_JSON).expect("fixture registry parses")
}

/// Writes the fixture registry into `dir` and returns its path.
pub fn write_registry(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("cog-registry.json");
    std::fs::write(&path, REGISTRY_JSON).expect("write registry fixture");
    path
}

pub fn rope(text: &str) -> ropey::Rope {
    ropey::Rope::from_str(text)
}

pub fn labels(items: &[tower_lsp::lsp_types::CompletionItem]) -> Vec<&str> {
    let mut labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
    labels.sort_unstable();
    labels
}
