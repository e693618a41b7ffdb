//! LSP protocol handler implementations
//!
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Completion over scenario files
//! - The run-scenario command

use std::sync::Arc;
use std::sync::atomic::Ordering;

use serde_json::Value;
use tower_lsp::{LanguageServer, jsonrpc};
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, ExecuteCommandOptions,
    ExecuteCommandParams, InitializeParams, InitializeResult, InitializedParams, MessageType,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use tower_lsp::jsonrpc::Result as LspResult;
use tracing::{debug, error, info, warn};

use crate::config::InitializationOptions;
use crate::lsp::command::{CommandError, RUN_SCENARIO_COMMAND, scenario_path};
use crate::lsp::features::completion::{Trigger, complete};
use crate::lsp::models::LspDocument;
use crate::lsp::schema::{YamlSchemaHost, is_scenario_resource, register_scenario_schema};

use super::state::CrankBackend;

#[tower_lsp::async_trait]
impl LanguageServer for CrankBackend {
    /// Handles the LSP initialize request, registering the schema and declaring capabilities.
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize from {:?}", params.client_info.as_ref().map(|c| &c.name));

        let options = InitializationOptions::from_value(params.initialization_options);
        {
            let mut schemas = self.services.schemas.write().await;
            let host = options
                .yaml_schema_support()
                .then_some(&mut *schemas as &mut dyn YamlSchemaHost);
            if let Err(e) = register_scenario_schema(host) {
                warn!("{}", e);
                self.schema_warning_pending.store(true, Ordering::SeqCst);
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(Trigger::CHARACTERS.iter().map(|c| c.to_string()).collect()),
                    ..Default::default()
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![RUN_SCENARIO_COMMAND.to_string()],
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("Initialized, registry at {:?}", self.services.registry.path());
        self.flush_schema_warning().await;
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!("Opening document: URI={}, version={}", params.text_document.uri, params.text_document.version);
        let uri = params.text_document.uri;
        let id = self.serial_document_id.fetch_add(1, Ordering::SeqCst);
        let document = Arc::new(LspDocument::new(
            id,
            uri.clone(),
            &params.text_document.text,
            params.text_document.version,
        ));
        self.documents_by_uri.write().await.insert(uri, document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!("textDocument/didChange: {} v{}", params.text_document.uri, params.text_document.version);
        let uri = params.text_document.uri;
        match self.document(&uri).await {
            Some(document) => {
                if let Err(e) = document.apply(params.content_changes, params.text_document.version).await {
                    warn!("Failed to apply changes to {}: {}", uri, e);
                }
            }
            None => warn!("Change for unknown document URI={}", uri),
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(document) = self.documents_by_uri.write().await.remove(&uri) {
            info!("Closed document: {}, id: {}", uri, document.id);
        } else {
            warn!("Failed to find document with URI={}", uri);
        }
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        if !is_scenario_resource(uri.as_str()) {
            return Ok(None);
        }
        let Some(document) = self.document(&uri).await else {
            debug!("Document not found: {}", uri);
            return Ok(None);
        };

        let trigger = Trigger::from_character(
            params
                .context
                .as_ref()
                .and_then(|context| context.trigger_character.as_deref()),
        );
        let rope = document.rope().await;
        let registry = self.services.registry.get();

        let items = complete(registry.as_deref(), &rope, position, trigger);
        debug!("Completion at {}:{:?} ({:?}): {} items", uri, position, trigger, items.len());

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        if params.command != RUN_SCENARIO_COMMAND {
            warn!("Unknown command {}", params.command);
            return Err(jsonrpc::Error::method_not_found());
        }

        let path = params
            .arguments
            .first()
            .ok_or(CommandError::MissingPath)
            .and_then(scenario_path);
        let path = match path {
            Ok(path) => path,
            Err(e) => {
                self.client.show_message(MessageType::ERROR, e.to_string()).await;
                return Ok(None);
            }
        };

        self.client
            .show_message(MessageType::INFO, format!("Running Scenario: {}", path))
            .await;
        if let Err(e) = self.services.terminal.run_scenario(&path).await {
            error!("Failed to run scenario {}: {}", path, e);
            self.client.show_message(MessageType::ERROR, e.to_string()).await;
        }
        Ok(None)
    }
}
