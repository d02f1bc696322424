//! Replay-time element resolution.
//!
//! A stored [`StepElement`](webminer_core_types::StepElement) carries one or
//! more query descriptors. Each descriptor is polled against the live page
//! until it matches or its timeout elapses:
//! - by-id: native identifier lookup
//! - css: structural query, all matching elements
//! - text: exact equality with trimmed text content
//!
//! The step's elements are the intersection of every descriptor's matches.

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
