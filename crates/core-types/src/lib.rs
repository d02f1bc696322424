//! Shared data model for the webminer engine.
//!
//! Everything that crosses a crate boundary or survives storage lives here:
//! query descriptors produced at record time, the steps and scripts that hold
//! them, the user's facet selection, and the outbound tab request.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod query;
pub mod script;
pub mod selection;
pub mod tabs;

pub use query::{QueryDescriptor, SearchApi, StepElement};
pub use script::{Command, Script, Step};
pub use selection::{Facet, FacetKey, FacetParseError, SelectionSet};
pub use tabs::OpenLinksRequest;

/// Opaque identity of a live element inside one page.
///
/// Handles are only meaningful for the page adapter that produced them; they
/// are compared and hashed so resolver result sets can be intersected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
