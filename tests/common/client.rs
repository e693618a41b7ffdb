//! In-process LSP client speaking JSON-RPC with Content-Length framing over
//! in-memory pipes.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tower_lsp::{LspService, Server};

use crank_scenario_language_server::lsp::backend::{
    CrankBackend, SCHEMA_CONTENT_METHOD, SCHEMA_URI_METHOD,
};
use crank_scenario_language_server::lsp::services::ScenarioServices;

const TIMEOUT: Duration = Duration::from_secs(10);

pub struct LspClient {
    writer: DuplexStream,
    reader: BufReader<DuplexStream>,
    next_id: i64,
    /// Server notifications received so far, in arrival order
    pub notifications: Vec<Value>,
}

impl LspClient {
    /// Starts a server over `services` and connects to it.
    pub fn start(services: Arc<ScenarioServices>) -> Self {
        let (writer, server_in) = tokio::io::duplex(1 << 16);
        let (server_out, reader) = tokio::io::duplex(1 << 16);

        let (service, socket) = LspService::build(move |client| CrankBackend::new(client, services, None))
            .custom_method(SCHEMA_URI_METHOD, CrankBackend::schema_uri)
            .custom_method(SCHEMA_CONTENT_METHOD, CrankBackend::schema_content)
            .finish();
        tokio::spawn(Server::new(server_in, server_out, socket).serve(service));

        Self {
            writer,
            reader: BufReader::new(reader),
            next_id: 1,
            notifications: Vec::new(),
        }
    }

    /// Runs the initialize handshake.
    pub async fn initialize(&mut self, options: Option<Value>) -> Value {
        let result = self
            .request(
                "initialize",
                json!({
                    "processId": null,
                    "rootUri": null,
                    "capabilities": {},
                    "initializationOptions": options,
                }),
            )
            .await;
        self.notify("initialized", json!({})).await;
        result
    }

    async fn send(&mut self, message: Value) {
        let body = message.to_string();
        let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
        self.writer.write_all(frame.as_bytes()).await.expect("write frame");
        self.writer.flush().await.expect("flush frame");
    }

    async fn receive(&mut self) -> Value {
        let mut content_length = None;
        loop {
            let mut header = String::new();
            self.reader.read_line(&mut header).await.expect("read header");
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some(value) = header.strip_prefix("Content-Length: ") {
                content_length = Some(value.parse::<usize>().expect("numeric Content-Length"));
            }
        }
        let mut body = vec![0; content_length.expect("Content-Length header")];
        self.reader.read_exact(&mut body).await.expect("read body");
        serde_json::from_slice(&body).expect("JSON body")
    }

    /// Sends a request and waits for its response, collecting notifications
    /// that arrive first. Returns the `result`, or the `error` object.
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;

        tokio::time::timeout(TIMEOUT, async {
            loop {
                let message = self.receive().await;
                if message.get("id") == Some(&json!(id)) && message.get("method").is_none() {
                    return message
                        .get("result")
                        .or_else(|| message.get("error"))
                        .cloned()
                        .unwrap_or(Value::Null);
                }
                self.notifications.push(message);
            }
        })
        .await
        .expect("response before timeout")
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        self.send(json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await;
        // Notifications are not acknowledged; give the server a moment.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    /// Waits until a notification with `method` satisfying `pred` arrives.
    pub async fn wait_for_notification(&mut self, method: &str, pred: impl Fn(&Value) -> bool) -> Value {
        if let Some(found) = self
            .notifications
            .iter()
            .find(|n| n["method"] == method && pred(&n["params"]))
        {
            return found.clone();
        }
        tokio::time::timeout(TIMEOUT, async {
            loop {
                let message = self.receive().await;
                let matched = message["method"] == method && pred(&message["params"]);
                self.notifications.push(message.clone());
                if matched {
                    return message;
                }
            }
        })
        .await
        .expect("notification before timeout")
    }

    pub async fn open(&mut self, uri: &str, text: &str) {
        self.notify(
            "textDocument/didOpen",
            json!({
                "textDocument": {"uri": uri, "languageId": "yaml", "version": 1, "text": text}
            }),
        )
        .await;
    }

    pub async fn completion(&mut self, uri: &str, line: u32, character: u32, trigger: Option<&str>) -> Value {
        let context = match trigger {
            Some(c) => json!({"triggerKind": 2, "triggerCharacter": c}),
            None => json!({"triggerKind": 1}),
        };
        self.request(
            "textDocument/completion",
            json!({
                "textDocument": {"uri": uri},
                "position": {"line": line, "character": character},
                "context": context,
            }),
        )
        .await
    }
}

/// Labels of a completion response, sorted.
pub fn completion_labels(response: &Value) -> Vec<String> {
    let items = match response {
        Value::Array(items) => items.clone(),
        Value::Object(list) => list
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    let mut labels: Vec<String> = items
        .iter()
        .filter_map(|item| item["label"].as_str().map(str::to_string))
        .collect();
    labels.sort();
    labels
}
