use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tower_lsp::Client;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::{MessageType, Url};
use tracing::{debug, info, warn};

use crate::lsp::command::ShellEvent;
use crate::lsp::models::LspDocument;
use crate::lsp::services::ScenarioServices;

mod state;
mod handlers;

pub use state::CrankBackend;

/// Params of `crank/schemaUri`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaUriParams {
    pub resource: String,
}

/// Params of `crank/schemaContent`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaContentParams {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaResponse {
    pub value: Option<String>,
}

pub const SCHEMA_URI_METHOD: &str = "crank/schemaUri";
pub const SCHEMA_CONTENT_METHOD: &str = "crank/schemaContent";

impl CrankBackend {
    /// Creates the backend. Shell events are relayed to the client log for
    /// as long as the backend lives.
    pub fn new(
        client: Client,
        services: Arc<ScenarioServices>,
        shell_events: Option<mpsc::UnboundedReceiver<ShellEvent>>,
    ) -> Self {
        let backend = Self {
            client,
            documents_by_uri: Arc::new(RwLock::new(HashMap::new())),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            services,
            schema_warning_pending: Arc::new(AtomicBool::new(false)),
        };

        if let Some(events) = shell_events {
            Self::spawn_shell_relay(backend.clone(), events);
        }

        backend
    }

    pub fn services(&self) -> &ScenarioServices {
        &self.services
    }

    fn spawn_shell_relay(backend: CrankBackend, mut events: mpsc::UnboundedReceiver<ShellEvent>) {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ShellEvent::Output { session, line } => {
                        backend
                            .client
                            .log_message(MessageType::LOG, format!("[crank:{}] {}", session, line))
                            .await;
                    }
                    ShellEvent::Closed { session } => {
                        backend.services.terminal.on_session_closed(session).await;
                    }
                }
            }
            debug!("Shell event channel closed");
        });
    }

    async fn document(&self, uri: &Url) -> Option<Arc<LspDocument>> {
        self.documents_by_uri.read().await.get(uri).cloned()
    }

    /// Sends the missing-schema-host warning at most once.
    async fn flush_schema_warning(&self) {
        if self.schema_warning_pending.swap(false, Ordering::SeqCst) {
            self.client
                .show_message(
                    MessageType::WARNING,
                    "No YAML schema support is available. Scenario files will not be validated.",
                )
                .await;
        }
    }

    /// Handles `crank/schemaUri`.
    pub async fn schema_uri(&self, params: SchemaUriParams) -> LspResult<SchemaResponse> {
        let value = self.services.schemas.read().await.schema_uri_for(&params.resource);
        debug!("Schema URI for {}: {:?}", params.resource, value);
        Ok(SchemaResponse { value })
    }

    /// Handles `crank/schemaContent`.
    pub async fn schema_content(&self, params: SchemaContentParams) -> LspResult<SchemaResponse> {
        let value = self.services.schemas.read().await.schema_content_for(&params.uri);
        if value.is_none() {
            warn!("No schema content for {}", params.uri);
        } else {
            info!("Serving schema content for {}", params.uri);
        }
        Ok(SchemaResponse { value })
    }
}
