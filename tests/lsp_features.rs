//! End-to-end tests through the JSON-RPC surface

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::json;

use crank_scenario_language_server::lsp::command::{
    CommandError, RUN_SCENARIO_COMMAND, SessionFactory, ShellSession,
};
use crank_scenario_language_server::lsp::schema::SCHEMA_URI;
use crank_scenario_language_server::lsp::services::ScenarioServices;
use crank_scenario_language_server::registry::RegistryAccessor;

use common::client::{LspClient, completion_labels};

const URI: &str = "file:///work/login.crank.yml";

struct RecordingSession {
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ShellSession for RecordingSession {
    fn id(&self) -> u64 {
        1
    }

    fn name(&self) -> &str {
        "crank"
    }

    async fn send_text(&mut self, text: &str) -> Result<(), CommandError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct RecordingFactory {
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SessionFactory for RecordingFactory {
    async fn create(&self, _name: &str) -> Result<Box<dyn ShellSession>, CommandError> {
        Ok(Box::new(RecordingSession { sent: self.sent.clone() }))
    }
}

fn services(registry: RegistryAccessor) -> (Arc<ScenarioServices>, Arc<Mutex<Vec<String>>>) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let factory = RecordingFactory { sent: sent.clone() };
    (Arc::new(ScenarioServices::new(registry, Box::new(factory), "crank")), sent)
}

#[tokio::test]
async fn test_initialize_advertises_capabilities() {
    let (services, _) = services(RegistryAccessor::preloaded(common::registry()));
    let mut client = LspClient::start(services);

    let result = client.initialize(None).await;
    let capabilities = &result["capabilities"];
    assert_eq!(capabilities["completionProvider"]["triggerCharacters"], json!([" ", "{"]));
    assert_eq!(capabilities["executeCommandProvider"]["commands"], json!([RUN_SCENARIO_COMMAND]));
    assert_eq!(capabilities["textDocumentSync"], json!(2));
}

#[tokio::test]
async fn test_completion_by_trigger_character() {
    let (services, _) = services(RegistryAccessor::preloaded(common::registry()));
    let mut client = LspClient::start(services);
    client.initialize(None).await;

    let text = "scenario: Login\nsteps:\n- cog: automatoninc/web\n  stepId: \n- step: \n";
    client.open(URI, text).await;

    let step_ids = client.completion(URI, 3, 10, Some(" ")).await;
    assert_eq!(completion_labels(&step_ids), vec!["EnterValueIntoField", "NavigateToPage"]);

    let expressions = client.completion(URI, 4, 8, Some(" ")).await;
    assert_eq!(completion_labels(&expressions).len(), 4);

    // Nothing is in scope for tokens yet
    let tokens = client.completion(URI, 4, 8, Some("{")).await;
    assert!(tokens.is_null());
}

#[tokio::test]
async fn test_token_completion_after_edit() {
    let (services, _) = services(RegistryAccessor::preloaded(common::registry()));
    let mut client = LspClient::start(services);
    client.initialize(None).await;

    let text = concat!(
        "steps:\n",
        "- step: I do a thing\n",
        "  data:\n",
        "    target: x\n",
        "- step: I do another thing\n",
        "  data:\n",
        "    target: \n",
    );
    client.open(URI, text).await;
    client
        .notify(
            "textDocument/didChange",
            json!({
                "textDocument": {"uri": URI, "version": 2},
                "contentChanges": [{
                    "range": {"start": {"line": 6, "character": 12}, "end": {"line": 6, "character": 12}},
                    "text": "{"
                }]
            }),
        )
        .await;

    let response = client.completion(URI, 6, 13, Some("{")).await;
    assert_eq!(completion_labels(&response), vec!["{cog-name.rec.*}", "{cog-name.rec.out}"]);
    let edit = &response[0]["textEdit"];
    assert_eq!(edit["range"]["start"], json!({"line": 6, "character": 12}));
}

#[tokio::test]
async fn test_completion_ignores_other_files() {
    let (services, _) = services(RegistryAccessor::preloaded(common::registry()));
    let mut client = LspClient::start(services);
    client.initialize(None).await;

    let uri = "file:///work/notes.yml";
    client.open(uri, "- step: \n").await;
    assert!(client.completion(uri, 0, 8, Some(" ")).await.is_null());
}

#[tokio::test]
async fn test_missing_registry_degrades_to_static_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let (services, _) = services(RegistryAccessor::new(dir.path().join("absent.json")));
    let mut client = LspClient::start(services);
    client.initialize(None).await;

    let text = indoc! {"
        tokens:
          base: https://example.com
        steps:
        - step: I do a thing
          data:
            url: {}
    "};
    client.open(URI, text).await;

    assert!(client.completion(URI, 3, 8, Some(" ")).await.is_null());
    let tokens = client.completion(URI, 5, 10, Some("{")).await;
    assert_eq!(completion_labels(&tokens), vec!["{base}"]);
}

#[tokio::test]
async fn test_schema_requests() {
    let (services, _) = services(RegistryAccessor::preloaded(common::registry()));
    let mut client = LspClient::start(services);
    client.initialize(None).await;

    let uri = client.request("crank/schemaUri", json!({"resource": URI})).await;
    assert_eq!(uri["value"], json!(SCHEMA_URI));

    let other = client.request("crank/schemaUri", json!({"resource": "file:///a.yml"})).await;
    assert!(other["value"].is_null());

    let content = client.request("crank/schemaContent", json!({"uri": SCHEMA_URI})).await;
    let schema: serde_json::Value = serde_json::from_str(content["value"].as_str().unwrap()).unwrap();
    assert!(schema["properties"]["steps"].is_object());

    let foreign = client
        .request("crank/schemaContent", json!({"uri": "https://example.com/schema"}))
        .await;
    assert!(foreign["value"].is_null());
}

#[tokio::test]
async fn test_no_schema_host_warns_once() {
    let (services, _) = services(RegistryAccessor::preloaded(common::registry()));
    let mut client = LspClient::start(services);
    client.initialize(Some(json!({"yamlSchemaSupport": false}))).await;

    let warning = client
        .wait_for_notification("window/showMessage", |params| params["type"] == json!(2))
        .await;
    assert!(warning["params"]["message"].as_str().unwrap().contains("YAML schema"));

    let uri = client.request("crank/schemaUri", json!({"resource": URI})).await;
    assert!(uri["value"].is_null());

    let warnings = client
        .notifications
        .iter()
        .filter(|n| n["method"] == "window/showMessage" && n["params"]["type"] == json!(2))
        .count();
    assert_eq!(warnings, 1);
}

#[tokio::test]
async fn test_run_scenario_command() {
    let (services, sent) = services(RegistryAccessor::preloaded(common::registry()));
    let mut client = LspClient::start(services.clone());
    client.initialize(None).await;

    let result = client
        .request(
            "workspace/executeCommand",
            json!({"command": RUN_SCENARIO_COMMAND, "arguments": ["file:///work/login.crank.yml"]}),
        )
        .await;
    assert!(result.is_null());

    let info = client
        .wait_for_notification("window/showMessage", |params| params["type"] == json!(3))
        .await;
    assert_eq!(info["params"]["message"], json!("Running Scenario: /work/login.crank.yml"));
    assert_eq!(*sent.lock().unwrap(), vec!["clear", "crank run /work/login.crank.yml"]);
    assert!(services.terminal.has_session().await);
}

#[tokio::test]
async fn test_run_scenario_without_argument() {
    let (services, sent) = services(RegistryAccessor::preloaded(common::registry()));
    let mut client = LspClient::start(services);
    client.initialize(None).await;

    client
        .request("workspace/executeCommand", json!({"command": RUN_SCENARIO_COMMAND, "arguments": []}))
        .await;
    let error = client
        .wait_for_notification("window/showMessage", |params| params["type"] == json!(1))
        .await;
    assert!(error["params"]["message"].as_str().unwrap().contains("missing"));
    assert!(sent.lock().unwrap().is_empty());
}
