//! Core shared library for the finders workspace.
//!
//! This crate exposes the ambient pieces the finder crates depend on:
//! the common error type, configuration loading, the Postgres pool wrapper
//! and logging setup.

pub mod config;
pub mod db;
pub mod errors;
pub mod logging;

pub use config::{load_finder_config, Environment, FinderConfig, SearchConfig};
pub use db::DatabasePool;
pub use errors::{ConfigError, FinderError, Result as CoreResult};
pub use logging::init_tracing;
