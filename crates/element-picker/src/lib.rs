//! Record-time half of webminer.
//!
//! A picked element is fingerprinted, the user toggles facets into a
//! [`SelectionSet`], and the synthesizer turns that selection into the query
//! descriptors a step stores for replay.

pub mod fingerprint;
pub mod synthesizer;

pub use fingerprint::{capture, fingerprint, Fingerprint, TEXT_LIMIT};
pub use synthesizer::{step_element, synthesize, synthesize_for};
pub use webminer_core_types::{Facet, FacetKey, SelectionSet};
