//! Lookup strategies, one per search API.
//!
//! A strategy performs a single lookup; polling and timeouts live in the
//! resolver.

use async_trait::async_trait;
use page_adapter::PageAdapter;
use tracing::trace;
use webminer_core_types::{ElementHandle, SearchApi};

use crate::errors::LocatorError;

/// Strategy trait for a single lookup
#[async_trait]
pub trait LookupStrategy: Send + Sync {
    /// Elements currently matching `query`, in document order
    async fn lookup(
        &self,
        page: &dyn PageAdapter,
        query: &str,
    ) -> Result<Vec<ElementHandle>, LocatorError>;

    /// Search API this strategy serves
    fn search_api(&self) -> SearchApi;

    /// Get strategy name
    fn name(&self) -> &'static str {
        self.search_api().name()
    }
}

/// Native identifier lookup
#[derive(Debug, Default)]
pub struct ByIdStrategy;

#[async_trait]
impl LookupStrategy for ByIdStrategy {
    async fn lookup(
        &self,
        page: &dyn PageAdapter,
        query: &str,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        if query.is_empty() {
            return Err(LocatorError::InvalidQuery {
                api: self.name(),
                reason: "empty identifier".to_string(),
            });
        }
        Ok(page.element_by_id(query).await?.into_iter().collect())
    }

    fn search_api(&self) -> SearchApi {
        SearchApi::ById
    }
}

/// Structural CSS query
#[derive(Debug, Default)]
pub struct CssQueryStrategy;

#[async_trait]
impl LookupStrategy for CssQueryStrategy {
    async fn lookup(
        &self,
        page: &dyn PageAdapter,
        query: &str,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        if query.trim().is_empty() {
            return Err(LocatorError::InvalidQuery {
                api: self.name(),
                reason: "empty selector".to_string(),
            });
        }
        Ok(page.query_selector_all(query).await?)
    }

    fn search_api(&self) -> SearchApi {
        SearchApi::CssQuery
    }
}

/// Exact equality with trimmed text content
///
/// Scans every element of the page, or only `candidates` when given.
#[derive(Debug, Default)]
pub struct TextEqualityStrategy {
    candidates: Option<Vec<ElementHandle>>,
}

impl TextEqualityStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the scan to a pre-filtered candidate list.
    pub fn with_candidates(candidates: Vec<ElementHandle>) -> Self {
        Self {
            candidates: Some(candidates),
        }
    }
}

#[async_trait]
impl LookupStrategy for TextEqualityStrategy {
    async fn lookup(
        &self,
        page: &dyn PageAdapter,
        query: &str,
    ) -> Result<Vec<ElementHandle>, LocatorError> {
        let wanted = query.trim();
        if wanted.is_empty() {
            return Err(LocatorError::InvalidQuery {
                api: self.name(),
                reason: "empty text".to_string(),
            });
        }

        let matches = page
            .elements_with_text(wanted, self.candidates.as_deref())
            .await?;
        trace!(text = wanted, matched = matches.len(), "text scan");
        Ok(matches)
    }

    fn search_api(&self) -> SearchApi {
        SearchApi::TextEquality
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_adapter::{ElementSpec, MemoryPage};

    fn page() -> MemoryPage {
        MemoryPage::with_body(
            "https://example.com/",
            [
                ElementSpec::new("p").id("intro").text("  Welcome  "),
                ElementSpec::new("ul").children([
                    ElementSpec::new("li").text("Item"),
                    ElementSpec::new("li").text("Item"),
                    ElementSpec::new("li").text("Items"),
                ]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_by_id() {
        let page = page();
        let found = tokio_test::block_on(ByIdStrategy.lookup(&page, "intro")).unwrap();
        assert_eq!(found, page.select("#intro").unwrap());
        let missing = tokio_test::block_on(ByIdStrategy.lookup(&page, "nope")).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_css_invalid_selector_is_not_retryable() {
        let page = page();
        let err = tokio_test::block_on(CssQueryStrategy.lookup(&page, "li[")).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_text_equality_is_exact_after_trim() {
        let page = page();
        let strategy = TextEqualityStrategy::new();
        let items = tokio_test::block_on(strategy.lookup(&page, "Item")).unwrap();
        assert_eq!(items.len(), 2);

        let welcome = tokio_test::block_on(strategy.lookup(&page, "Welcome")).unwrap();
        assert_eq!(welcome, page.select("p").unwrap());
    }

    #[test]
    fn test_text_equality_with_candidates() {
        let page = page();
        let first_item = page.select("li").unwrap()[0];
        let strategy = TextEqualityStrategy::with_candidates(vec![first_item]);
        let found = tokio_test::block_on(strategy.lookup(&page, "Item")).unwrap();
        assert_eq!(found, vec![first_item]);
    }
}
