//! Crank'd client — session coordinator for the cycling coach backend.

pub mod coach;
pub mod config;
pub mod error;
pub mod identity;
pub mod linker;
pub mod orchestrator;
pub mod profile;
pub mod repl;
pub mod session;
pub mod store;
