pub mod config;
pub mod logging;
pub mod lsp;
pub mod registry;
pub mod scenario;
