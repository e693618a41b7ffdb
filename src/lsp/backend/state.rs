//! Backend state management
//!
//! This module defines the CrankBackend struct, which holds the open
//! documents and the shared scenario services.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32};

use tokio::sync::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::lsp::models::LspDocument;
use crate::lsp::services::ScenarioServices;

/// The scenario language server backend, managing state and handling LSP requests.
#[derive(Clone)]
pub struct CrankBackend {
    pub(super) client: Client,
    pub(super) documents_by_uri: Arc<RwLock<HashMap<Url, Arc<LspDocument>>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    pub(super) services: Arc<ScenarioServices>,
    /// Set during initialize when the client cannot host the schema
    pub(super) schema_warning_pending: Arc<AtomicBool>,
}

impl std::fmt::Debug for CrankBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrankBackend")
            .field("services", &self.services)
            .field("documents_count", &"<HashMap>")
            .finish()
    }
}
