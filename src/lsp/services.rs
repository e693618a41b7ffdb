//! Long-lived state shared by every request
//!
//! Built once at startup and handed to the backend, rather than living in
//! module-level statics.

use tokio::sync::{RwLock, mpsc};

use crate::config::ServerConfig;
use crate::registry::RegistryAccessor;

use super::command::{ProcessShellFactory, SessionFactory, ShellEvent, TerminalManager};
use super::schema::SchemaRegistry;

#[derive(Debug)]
pub struct ScenarioServices {
    pub registry: RegistryAccessor,
    pub schemas: RwLock<SchemaRegistry>,
    pub terminal: TerminalManager,
}

impl ScenarioServices {
    pub fn new(registry: RegistryAccessor, sessions: Box<dyn SessionFactory>, runner: impl Into<String>) -> Self {
        Self {
            registry,
            schemas: RwLock::new(SchemaRegistry::new()),
            terminal: TerminalManager::new(sessions, runner),
        }
    }

    /// Services backed by the registry file and the user's shell. Shell
    /// events are delivered on the returned receiver.
    pub fn from_config(config: &ServerConfig) -> (Self, mpsc::UnboundedReceiver<ShellEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let services = Self::new(
            RegistryAccessor::new(&config.registry_path),
            Box::new(ProcessShellFactory::new(events_tx)),
            config.runner.clone(),
        );
        (services, events_rx)
    }
}
