//! webminer command line
//!
//! Exposes the configuration and CLI modules for integration testing.

pub mod cli;
pub mod config;

pub use config::AppConfig;
