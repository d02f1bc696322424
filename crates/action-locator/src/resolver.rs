//! Polling resolver with result intersection

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use page_adapter::PageAdapter;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webminer_core_types::{ElementHandle, QueryDescriptor, SearchApi, StepElement};

use crate::strategies::*;
use crate::types::*;

/// Element resolver trait
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Resolve a step element and report how every descriptor fared
    async fn resolve_detailed(
        &self,
        page: &dyn PageAdapter,
        element: &StepElement,
        cancel: &CancellationToken,
    ) -> ResolutionReport;

    /// Live elements matching every descriptor; empty when nothing matched
    async fn resolve(
        &self,
        page: &dyn PageAdapter,
        element: &StepElement,
        cancel: &CancellationToken,
    ) -> Vec<ElementHandle> {
        self.resolve_detailed(page, element, cancel).await.elements
    }
}

/// Default element resolver implementation
pub struct DefaultElementResolver {
    config: ResolverConfig,
    by_id: Arc<ByIdStrategy>,
    css: Arc<CssQueryStrategy>,
    text: Arc<TextEqualityStrategy>,
}

impl Default for DefaultElementResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl DefaultElementResolver {
    /// Create a new resolver with all strategies
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            by_id: Arc::new(ByIdStrategy),
            css: Arc::new(CssQueryStrategy),
            text: Arc::new(TextEqualityStrategy::new()),
        }
    }

    /// Replace the text strategy, e.g. to scan a candidate list only
    pub fn with_text_strategy(mut self, strategy: TextEqualityStrategy) -> Self {
        self.text = Arc::new(strategy);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Get strategy by search API
    fn get_strategy(&self, api: SearchApi) -> Arc<dyn LookupStrategy> {
        match api {
            SearchApi::ById => self.by_id.clone(),
            SearchApi::CssQuery => self.css.clone(),
            SearchApi::TextEquality => self.text.clone(),
        }
    }

    /// Poll one descriptor until it matches, times out, fails hard, or is cancelled
    async fn poll(
        &self,
        page: &dyn PageAdapter,
        descriptor: &QueryDescriptor,
        cancel: &CancellationToken,
    ) -> DescriptorOutcome {
        let strategy = self.get_strategy(descriptor.search_api);
        let started = Instant::now();
        let deadline = started + self.config.timeout();
        let mut attempts = 0u32;

        let finish = |matches: Vec<ElementHandle>, end: PollEnd, attempts: u32, error: Option<String>| {
            DescriptorOutcome {
                descriptor: descriptor.clone(),
                matches,
                end,
                attempts,
                elapsed_ms: started.elapsed().as_millis() as u64,
                error,
            }
        };

        loop {
            if cancel.is_cancelled() {
                debug!(descriptor = %descriptor, attempts, "Polling cancelled");
                return finish(Vec::new(), PollEnd::Cancelled, attempts, None);
            }

            attempts += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let lookup = tokio::time::timeout(
                remaining,
                strategy.lookup(page, &descriptor.query_string),
            );
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(descriptor = %descriptor, attempts, "Lookup cancelled");
                    return finish(Vec::new(), PollEnd::Cancelled, attempts, None);
                }
                result = lookup => match result {
                    Ok(result) => result,
                    Err(_) => {
                        debug!(descriptor = %descriptor, attempts, "Lookup outlived the timeout");
                        return finish(Vec::new(), PollEnd::TimedOut, attempts, None);
                    }
                },
            };
            match result {
                Ok(found) if !found.is_empty() => {
                    debug!(
                        descriptor = %descriptor,
                        matched = found.len(),
                        attempts,
                        "Descriptor matched"
                    );
                    return finish(found, PollEnd::Matched, attempts, None);
                }
                Ok(_) => {}
                Err(err) if err.is_retryable() => {
                    debug!(descriptor = %descriptor, error = %err, "Lookup failed, will retry");
                }
                Err(err) => {
                    warn!(descriptor = %descriptor, error = %err, "Lookup failed, giving up");
                    return finish(Vec::new(), PollEnd::Failed, attempts, Some(err.to_string()));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(descriptor = %descriptor, attempts, "Descriptor timed out");
                return finish(Vec::new(), PollEnd::TimedOut, attempts, None);
            }

            let wait = self.config.poll_interval().min(deadline - now);
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

/// Elements of `first` present in every other set, in `first`'s order.
fn intersect(outcomes: &[DescriptorOutcome]) -> Vec<ElementHandle> {
    let Some((first, rest)) = outcomes.split_first() else {
        return Vec::new();
    };
    let others: Vec<HashSet<ElementHandle>> = rest
        .iter()
        .map(|outcome| outcome.matches.iter().copied().collect())
        .collect();

    let mut seen = HashSet::new();
    first
        .matches
        .iter()
        .copied()
        .filter(|handle| others.iter().all(|set| set.contains(handle)))
        .filter(|handle| seen.insert(*handle))
        .collect()
}

#[async_trait]
impl ElementResolver for DefaultElementResolver {
    async fn resolve_detailed(
        &self,
        page: &dyn PageAdapter,
        element: &StepElement,
        cancel: &CancellationToken,
    ) -> ResolutionReport {
        let started = Instant::now();
        if element.is_empty() {
            warn!("Step element has no descriptors");
            return ResolutionReport::default();
        }

        let outcomes = join_all(
            element
                .selectors
                .iter()
                .map(|descriptor| self.poll(page, descriptor, cancel)),
        )
        .await;
        let elements = intersect(&outcomes);

        let report = ResolutionReport {
            elements,
            descriptors: outcomes,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        if report.is_empty() {
            info!(
                element = %element.describe(),
                elapsed_ms = report.elapsed_ms,
                "No elements resolved"
            );
        } else {
            info!(
                element = %element.describe(),
                matched = report.elements.len(),
                elapsed_ms = report.elapsed_ms,
                "Resolved step element"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_adapter::{AdapterError, DomEvent, ElementSnapshot, ElementSpec, MemoryPage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fast() -> DefaultElementResolver {
        DefaultElementResolver::new(ResolverConfig::new(
            Duration::from_millis(10),
            Duration::from_millis(150),
        ))
    }

    fn page() -> MemoryPage {
        MemoryPage::with_body(
            "https://example.com/",
            [
                ElementSpec::new("button").class("btn").text("Save"),
                ElementSpec::new("button").class("btn").text("Cancel"),
                ElementSpec::new("a").class("btn").text("Save"),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_element_times_out_empty() {
        let page = page();
        let element = StepElement::new(vec![QueryDescriptor::css("#missing")]);
        let report = fast()
            .resolve_detailed(&page, &element, &CancellationToken::new())
            .await;

        assert!(report.is_empty());
        assert_eq!(report.descriptors[0].end, PollEnd::TimedOut);
        assert!(report.descriptors[0].attempts > 1);
        assert!(report.elapsed_ms >= 150);
    }

    #[tokio::test]
    async fn test_intersection_of_css_and_text() {
        let page = page();
        let element = StepElement::new(vec![
            QueryDescriptor::css("button.btn"),
            QueryDescriptor::text("Save"),
        ]);
        let found = fast()
            .resolve(&page, &element, &CancellationToken::new())
            .await;
        assert_eq!(found, vec![page.select("button").unwrap()[0]]);
    }

    #[tokio::test]
    async fn test_one_empty_descriptor_empties_result() {
        let page = page();
        let element = StepElement::new(vec![
            QueryDescriptor::css("button.btn"),
            QueryDescriptor::text("Delete"),
        ]);
        let report = fast()
            .resolve_detailed(&page, &element, &CancellationToken::new())
            .await;
        assert!(report.is_empty());
        assert_eq!(report.descriptors[0].end, PollEnd::Matched);
        assert_eq!(report.descriptors[1].end, PollEnd::TimedOut);
        assert_eq!(report.unmatched().count(), 1);
    }

    #[tokio::test]
    async fn test_waits_for_late_element() {
        let page = page();
        let resolver = DefaultElementResolver::new(ResolverConfig::new(
            Duration::from_millis(10),
            Duration::from_secs(2),
        ));

        let writer = page.clone();
        let body = page.body();
        let insert = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            writer
                .append(body, ElementSpec::new("div").id("late"))
                .unwrap()
        });

        let element = StepElement::new(vec![QueryDescriptor::by_id("late")]);
        let found = resolver
            .resolve(&page, &element, &CancellationToken::new())
            .await;
        let inserted = insert.await.unwrap();
        assert_eq!(found, vec![inserted]);
    }

    #[tokio::test]
    async fn test_invalid_selector_stops_early() {
        let page = page();
        let resolver = DefaultElementResolver::new(ResolverConfig::new(
            Duration::from_millis(10),
            Duration::from_secs(5),
        ));
        let element = StepElement::new(vec![QueryDescriptor::css("button[")]);
        let report = resolver
            .resolve_detailed(&page, &element, &CancellationToken::new())
            .await;
        assert_eq!(report.descriptors[0].end, PollEnd::Failed);
        assert_eq!(report.descriptors[0].attempts, 1);
        assert!(report.descriptors[0].error.is_some());
    }

    #[tokio::test]
    async fn test_cancellation_ends_polling() {
        let page = page();
        let resolver = DefaultElementResolver::new(ResolverConfig::new(
            Duration::from_millis(10),
            Duration::from_secs(30),
        ));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let element = StepElement::new(vec![QueryDescriptor::css("#never")]);
        let report = resolver.resolve_detailed(&page, &element, &cancel).await;
        assert!(report.is_empty());
        assert!(report.was_cancelled());
        assert!(report.elapsed_ms < 30_000);
    }

    /// Memory page with a round-trip delay on every per-element call.
    struct SlowPage {
        inner: MemoryPage,
        delay: Duration,
        bulk_text: bool,
        text_calls: AtomicUsize,
    }

    impl SlowPage {
        fn rows(count: usize, bulk_text: bool) -> Self {
            let rows = (0..count).map(|i| ElementSpec::new("li").text(&format!("row {i}")));
            Self {
                inner: MemoryPage::with_body(
                    "https://example.com/",
                    [ElementSpec::new("ul").children(rows)],
                )
                .unwrap(),
                delay: Duration::from_millis(20),
                bulk_text,
                text_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageAdapter for SlowPage {
        async fn page_url(&self) -> Result<String, AdapterError> {
            self.inner.page_url().await
        }

        async fn element_by_id(&self, id: &str) -> Result<Option<ElementHandle>, AdapterError> {
            self.inner.element_by_id(id).await
        }

        async fn query_selector_all(
            &self,
            selector: &str,
        ) -> Result<Vec<ElementHandle>, AdapterError> {
            self.inner.query_selector_all(selector).await
        }

        async fn all_elements(&self) -> Result<Vec<ElementHandle>, AdapterError> {
            tokio::time::sleep(self.delay).await;
            self.inner.all_elements().await
        }

        async fn text_content(&self, handle: ElementHandle) -> Result<String, AdapterError> {
            self.text_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.inner.text_content(handle).await
        }

        async fn elements_with_text(
            &self,
            text: &str,
            candidates: Option<&[ElementHandle]>,
        ) -> Result<Vec<ElementHandle>, AdapterError> {
            if !self.bulk_text {
                // Per-element scan, one round trip per element.
                let scan = match candidates {
                    Some(candidates) => candidates.to_vec(),
                    None => self.all_elements().await?,
                };
                let mut matches = Vec::new();
                for handle in scan {
                    if self.text_content(handle).await?.trim() == text {
                        matches.push(handle);
                    }
                }
                return Ok(matches);
            }
            tokio::time::sleep(self.delay).await;
            self.inner.elements_with_text(text, candidates).await
        }

        async fn snapshot(&self, handle: ElementHandle) -> Result<ElementSnapshot, AdapterError> {
            self.inner.snapshot(handle).await
        }

        async fn click(&self, handle: ElementHandle) -> Result<(), AdapterError> {
            self.inner.click(handle).await
        }

        async fn set_value(&self, handle: ElementHandle, value: &str) -> Result<(), AdapterError> {
            self.inner.set_value(handle, value).await
        }

        async fn dispatch_event(
            &self,
            handle: ElementHandle,
            event: DomEvent,
        ) -> Result<(), AdapterError> {
            self.inner.dispatch_event(handle, event).await
        }

        async fn link_href(&self, handle: ElementHandle) -> Result<Option<String>, AdapterError> {
            self.inner.link_href(handle).await
        }
    }

    #[tokio::test]
    async fn test_slow_lookup_is_cut_at_timeout() {
        let page = SlowPage::rows(100, false);
        let resolver = DefaultElementResolver::new(ResolverConfig::new(
            Duration::from_millis(100),
            Duration::from_millis(300),
        ));
        let element = StepElement::new(vec![QueryDescriptor::text("missing")]);

        let started = std::time::Instant::now();
        let report = resolver
            .resolve_detailed(&page, &element, &CancellationToken::new())
            .await;
        let elapsed = started.elapsed();

        assert!(report.is_empty());
        assert_eq!(report.descriptors[0].end, PollEnd::TimedOut);
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(1_000), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_text_lookup_is_one_round_trip() {
        let page = SlowPage::rows(100, true);
        let resolver = DefaultElementResolver::new(ResolverConfig::new(
            Duration::from_millis(100),
            Duration::from_millis(300),
        ));
        let element = StepElement::new(vec![QueryDescriptor::text("row 42")]);

        let found = resolver
            .resolve(&page, &element, &CancellationToken::new())
            .await;

        assert_eq!(found.len(), 1);
        assert_eq!(page.text_calls.load(Ordering::SeqCst), 0);
        assert_eq!(page.inner.text_content(found[0]).await.unwrap(), "row 42");
    }

    #[test]
    fn test_intersect_keeps_first_order() {
        let outcome = |ids: &[u64]| DescriptorOutcome {
            descriptor: QueryDescriptor::css("x"),
            matches: ids.iter().copied().map(ElementHandle).collect(),
            end: PollEnd::Matched,
            attempts: 1,
            elapsed_ms: 0,
            error: None,
        };
        let merged = intersect(&[outcome(&[5, 3, 9, 1]), outcome(&[1, 9, 5]), outcome(&[9, 5, 7])]);
        assert_eq!(merged, vec![ElementHandle(5), ElementHandle(9)]);
        assert!(intersect(&[outcome(&[1]), outcome(&[])]).is_empty());
    }
}
