//! DOM port for webminer.
//!
//! Fingerprinting, resolution and execution all go through [`PageAdapter`].
//! Two implementations ship with the crate: [`MemoryPage`], an arena DOM
//! with its own selector engine used by tests and offline tooling, and
//! [`CdpPage`], which drives a live Chromium tab.

use async_trait::async_trait;
use webminer_core_types::ElementHandle;

pub mod cdp;
pub mod css;
pub mod errors;
pub mod memory;
pub mod types;

pub use cdp::{CdpPage, CdpSession, LaunchOptions};
pub use errors::{AdapterError, AdapterErrorKind};
pub use memory::{ElementSpec, Interaction, MemoryPage};
pub use types::{DomEvent, ElementSnapshot};

/// Async view of one live document.
#[async_trait]
pub trait PageAdapter: Send + Sync {
    /// URL of the document currently loaded.
    async fn page_url(&self) -> Result<String, AdapterError>;

    async fn element_by_id(&self, id: &str) -> Result<Option<ElementHandle>, AdapterError>;

    /// All element nodes matching `selector`, in document order.
    async fn query_selector_all(&self, selector: &str)
        -> Result<Vec<ElementHandle>, AdapterError>;

    /// Every element of the document, in document order.
    async fn all_elements(&self) -> Result<Vec<ElementHandle>, AdapterError>;

    /// Raw concatenated descendant text.
    async fn text_content(&self, handle: ElementHandle) -> Result<String, AdapterError>;

    /// Elements whose trimmed text content equals `text`, in document order.
    ///
    /// Scans every element, or only `candidates` when given. Candidates that
    /// went stale are skipped. The default costs one `text_content` call per
    /// element; adapters with expensive round trips override it.
    async fn elements_with_text(
        &self,
        text: &str,
        candidates: Option<&[ElementHandle]>,
    ) -> Result<Vec<ElementHandle>, AdapterError> {
        let scan = match candidates {
            Some(candidates) => candidates.to_vec(),
            None => self.all_elements().await?,
        };
        let mut matches = Vec::new();
        for handle in scan {
            match self.text_content(handle).await {
                Ok(content) if content.trim() == text => matches.push(handle),
                Ok(_) => {}
                Err(err) if err.kind == AdapterErrorKind::StaleHandle => {}
                Err(err) => return Err(err),
            }
        }
        Ok(matches)
    }

    async fn snapshot(&self, handle: ElementHandle) -> Result<ElementSnapshot, AdapterError>;

    async fn click(&self, handle: ElementHandle) -> Result<(), AdapterError>;

    async fn set_value(&self, handle: ElementHandle, value: &str) -> Result<(), AdapterError>;

    async fn dispatch_event(
        &self,
        handle: ElementHandle,
        event: DomEvent,
    ) -> Result<(), AdapterError>;

    /// `href` property when the element exposes one.
    async fn link_href(&self, handle: ElementHandle) -> Result<Option<String>, AdapterError>;
}
