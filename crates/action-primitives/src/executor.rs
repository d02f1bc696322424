//! Step executor: resolve the step's element, then apply its command.

use std::sync::Arc;
use std::time::Instant;

use action_locator::{DefaultElementResolver, ElementResolver};
use async_trait::async_trait;
use chrono::Utc;
use page_adapter::PageAdapter;
use tracing::{debug, info, warn};
use webminer_core_types::{Command, Step};

use crate::{
    dispatch::{LoggingTabDispatcher, TabDispatcher},
    errors::ActionError,
    primitives::{execute_click, execute_input_text, execute_open_link},
    types::{ActionReport, ExecCtx, TabSettings},
};

/// Executes one step against a page
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        page: &dyn PageAdapter,
        ctx: &ExecCtx,
        step: &Step,
    ) -> Result<ActionReport, ActionError>;
}

/// Default executor over an element resolver and a tab dispatcher
pub struct DefaultActionExecutor {
    resolver: Arc<dyn ElementResolver>,
    dispatcher: Arc<dyn TabDispatcher>,
    tabs: TabSettings,
}

impl Default for DefaultActionExecutor {
    fn default() -> Self {
        Self::new(
            Arc::new(DefaultElementResolver::default()),
            Arc::new(LoggingTabDispatcher::new()),
        )
    }
}

impl DefaultActionExecutor {
    pub fn new(resolver: Arc<dyn ElementResolver>, dispatcher: Arc<dyn TabDispatcher>) -> Self {
        Self {
            resolver,
            dispatcher,
            tabs: TabSettings::default(),
        }
    }

    pub fn with_tab_settings(mut self, tabs: TabSettings) -> Self {
        self.tabs = tabs;
        self
    }

    pub fn tab_settings(&self) -> TabSettings {
        self.tabs
    }
}

#[async_trait]
impl ActionExecutor for DefaultActionExecutor {
    async fn execute(
        &self,
        page: &dyn PageAdapter,
        ctx: &ExecCtx,
        step: &Step,
    ) -> Result<ActionReport, ActionError> {
        let started_at = Utc::now();
        let start_instant = Instant::now();

        let command = step.command.as_ref().ok_or(ActionError::NoCommand)?;
        if matches!(command, Command::Unknown) {
            return Err(ActionError::UnknownCommand(command.name().to_string()));
        }
        let element = step
            .element
            .as_ref()
            .ok_or_else(|| ActionError::ElementNotFound("step has no element".to_string()))?;

        info!(
            action_id = %ctx.action_id,
            command = command.name(),
            element = %element.describe(),
            "Executing step"
        );

        let report = self
            .resolver
            .resolve_detailed(page, element, &ctx.cancel_token)
            .await;
        if report.was_cancelled() || ctx.is_cancelled() {
            return Err(ActionError::Interrupted("cancelled while resolving".to_string()));
        }
        if report.is_empty() {
            for outcome in report.unmatched() {
                debug!(
                    descriptor = %outcome.descriptor,
                    end = ?outcome.end,
                    attempts = outcome.attempts,
                    "Descriptor matched nothing"
                );
            }
            warn!(action_id = %ctx.action_id, element = %element.describe(), "Element not found");
            return Err(ActionError::ElementNotFound(element.describe()));
        }
        let elements = report.elements;

        let (matched, links) = match command {
            Command::Click => (execute_click(page, ctx, &elements).await?, Vec::new()),
            Command::InputText { text } => (
                execute_input_text(page, ctx, &elements, text).await?,
                Vec::new(),
            ),
            Command::OpenLink { script_name } => {
                let links = execute_open_link(
                    page,
                    ctx,
                    &elements,
                    script_name.as_deref(),
                    self.tabs,
                    self.dispatcher.as_ref(),
                )
                .await?;
                (links.len(), links)
            }
            Command::Unknown => {
                return Err(ActionError::UnknownCommand(command.name().to_string()))
            }
        };

        let latency_ms = start_instant.elapsed().as_millis() as u64;
        info!(
            action_id = %ctx.action_id,
            command = command.name(),
            matched,
            latency_ms,
            "Step completed successfully"
        );
        Ok(ActionReport::success(started_at, latency_ms, command.name(), matched).with_links(links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::ResolverConfig;
    use page_adapter::{DomEvent, ElementSpec, Interaction, MemoryPage};
    use std::time::Duration;
    use webminer_core_types::{QueryDescriptor, StepElement};

    fn page() -> MemoryPage {
        MemoryPage::with_body(
            "https://example.com/list/",
            [
                ElementSpec::new("button").class("row").text("A"),
                ElementSpec::new("button").class("row").text("B"),
                ElementSpec::new("button").class("row").text("C"),
                ElementSpec::new("input").id("q").attr("type", "text"),
                ElementSpec::new("a").class("out").attr("href", "/one"),
                ElementSpec::new("span").class("out").text("not a link"),
                ElementSpec::new("a").class("out").attr("href", "https://other.example/two"),
            ],
        )
        .unwrap()
    }

    fn executor() -> (DefaultActionExecutor, Arc<LoggingTabDispatcher>) {
        let resolver = DefaultElementResolver::new(ResolverConfig::new(
            Duration::from_millis(10),
            Duration::from_millis(100),
        ));
        let dispatcher = Arc::new(LoggingTabDispatcher::new());
        let executor = DefaultActionExecutor::new(Arc::new(resolver), dispatcher.clone());
        (executor, dispatcher)
    }

    fn step(selector: &str, command: Command) -> Step {
        Step::new(StepElement::new(vec![QueryDescriptor::css(selector)]), command)
    }

    #[tokio::test]
    async fn test_click_acts_on_every_element() {
        let page = page();
        let (executor, _) = executor();
        let report = executor
            .execute(&page, &ExecCtx::default(), &step("button.row", Command::Click))
            .await
            .unwrap();

        assert!(report.ok);
        assert_eq!(report.matched_elements, 3);
        assert_eq!(page.clicks(), page.select("button.row").unwrap());
    }

    #[tokio::test]
    async fn test_input_text_sets_value_then_fires_events() {
        let page = page();
        let (executor, _) = executor();
        let step = Step::new(
            StepElement::new(vec![QueryDescriptor::by_id("q")]),
            Command::input_text("rust"),
        );
        executor
            .execute(&page, &ExecCtx::default(), &step)
            .await
            .unwrap();

        let input = page.select("#q").unwrap()[0];
        assert_eq!(page.value_of(input).as_deref(), Some("rust"));
        assert_eq!(
            page.interactions(),
            vec![
                Interaction::SetValue(input, "rust".into()),
                Interaction::Event(input, DomEvent::Input),
                Interaction::Event(input, DomEvent::Change),
            ]
        );
    }

    #[tokio::test]
    async fn test_open_link_filters_and_dispatches() {
        let page = page();
        let (executor, dispatcher) = executor();
        let executor = executor.with_tab_settings(TabSettings {
            max_tabs: 2,
            close_on_done: true,
        });
        let report = executor
            .execute(
                &page,
                &ExecCtx::default(),
                &step(".out", Command::open_link(Some("details".into()))),
            )
            .await
            .unwrap();

        let expected = vec![
            "https://example.com/one".to_string(),
            "https://other.example/two".to_string(),
        ];
        assert_eq!(report.opened_links, expected);
        let requests = dispatcher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].link_urls, expected);
        assert_eq!(requests[0].max_tabs, 2);
        assert!(requests[0].close_on_done);
        assert_eq!(requests[0].script_name.as_deref(), Some("details"));
    }

    #[tokio::test]
    async fn test_open_link_without_hrefs() {
        let page = page();
        let (executor, dispatcher) = executor();
        let err = executor
            .execute(&page, &ExecCtx::default(), &step("span", Command::open_link(None)))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NoValidLinks(1)));
        assert!(dispatcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_steps() {
        let page = page();
        let (executor, _) = executor();
        let ctx = ExecCtx::default();

        let no_command = Step {
            element: Some(StepElement::new(vec![QueryDescriptor::css("button")])),
            ..Step::default()
        };
        assert!(matches!(
            executor.execute(&page, &ctx, &no_command).await,
            Err(ActionError::NoCommand)
        ));

        assert!(matches!(
            executor.execute(&page, &ctx, &step("button", Command::Unknown)).await,
            Err(ActionError::UnknownCommand(_))
        ));

        let no_element = Step {
            command: Some(Command::Click),
            ..Step::default()
        };
        assert!(matches!(
            executor.execute(&page, &ctx, &no_element).await,
            Err(ActionError::ElementNotFound(_))
        ));
        assert!(page.interactions().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_element_is_not_found() {
        let page = page();
        let (executor, _) = executor();
        let err = executor
            .execute(&page, &ExecCtx::default(), &step("#missing", Command::Click))
            .await
            .unwrap_err();
        match err {
            ActionError::ElementNotFound(detail) => assert_eq!(detail, "css:#missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_context_is_interrupted() {
        let page = page();
        let (executor, _) = executor();
        let ctx = ExecCtx::default();
        ctx.cancel_token.cancel();
        let err = executor
            .execute(&page, &ctx, &step("button", Command::Click))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Interrupted(_)));
        assert!(page.clicks().is_empty());
    }
}
