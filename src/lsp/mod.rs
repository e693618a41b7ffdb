pub mod backend;
pub mod command;
pub mod document;
pub mod features;
pub mod models;
pub mod schema;
pub mod services;
