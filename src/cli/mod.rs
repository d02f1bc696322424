//! `webminer` command line.

pub mod app;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod play;
pub mod runtime;
pub mod scripts;
pub mod synthesize;

pub use app::run;
