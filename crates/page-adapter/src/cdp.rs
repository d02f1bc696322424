//! Chromium page driven over the DevTools Protocol.
//!
//! Every operation is a `Runtime.evaluate` call. Element identity lives in
//! the page: a small registry installed on `window.__webminer` hands out
//! numeric handles and maps them back to nodes. Navigating away drops the
//! registry, which turns old handles into [`AdapterErrorKind::StaleHandle`].
//! The registry holds nodes through `WeakRef` and periodically drops entries
//! for nodes that left the document, so detached subtrees can be collected.

use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webminer_core_types::ElementHandle;

use crate::errors::{AdapterError, AdapterErrorKind};
use crate::types::{DomEvent, ElementSnapshot};
use crate::PageAdapter;

const REGISTRY_JS: &str = r#"(() => {
  if (!window.__webminer) {
    const nodes = new Map();
    const ids = new WeakMap();
    let next = 1;
    let issued = 0;
    const sweep = () => {
      for (const [id, ref] of nodes) {
        const el = ref.deref();
        if (!el || !el.isConnected) nodes.delete(id);
      }
    };
    const escape = (value) => (window.CSS && CSS.escape ? CSS.escape(value) : value);
    const position = (el) => {
      let index = 1;
      for (let s = el.previousElementSibling; s; s = s.previousElementSibling) index++;
      return index;
    };
    window.__webminer = {
      handle(el) {
        let id = ids.get(el);
        if (id === undefined) {
          id = next++;
          ids.set(el, id);
        }
        if (!nodes.has(id)) {
          nodes.set(id, new WeakRef(el));
          if (++issued % 1024 === 0) sweep();
        }
        return id;
      },
      peek(id) {
        const ref = nodes.get(id);
        const el = ref && ref.deref();
        if (!el) {
          nodes.delete(id);
          return null;
        }
        return el;
      },
      node(id) {
        const el = this.peek(id);
        if (!el) throw new Error('webminer: stale handle ' + id);
        return el;
      },
      path(el) {
        if (!el.isConnected) return null;
        const segments = [];
        for (let cur = el; cur; cur = cur.parentElement) {
          if (cur.id && document.querySelectorAll('#' + escape(cur.id)).length === 1) {
            segments.push('#' + escape(cur.id));
            break;
          }
          const tag = cur.tagName.toLowerCase();
          if (tag === 'html') {
            segments.push('html');
            break;
          }
          segments.push(escape(tag) + ':nth-child(' + position(cur) + ')');
        }
        return segments.reverse().join(' > ');
      },
    };
  }
  return window.__webminer;
})()"#;

/// Browser launch settings.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Chrome/Chromium binary; chromiumoxide's detection when `None`.
    pub executable: Option<PathBuf>,
    pub headless: bool,
}

/// A launched browser plus the task pumping its CDP connection.
pub struct CdpSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl CdpSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, AdapterError> {
        let mut builder = BrowserConfig::builder();
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.executable {
            if !path.exists() {
                return Err(AdapterError::io(format!(
                    "chrome executable not found at {}",
                    path.display()
                )));
            }
            builder = builder.chrome_executable(path.clone());
        }
        let config = builder.build().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("browser config error: {err}"))
        })?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| AdapterError::io(format!("failed to launch browser: {err}")))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!(?err, "cdp handler stopped");
                    break;
                }
            }
        });
        info!(headless = options.headless, "browser launched");

        Ok(Self { browser, handler })
    }

    /// Open a new tab at `url` and wait for it to load.
    pub async fn open(&self, url: &str) -> Result<CdpPage, AdapterError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|err| AdapterError::io(format!("failed to open {url}: {err}")))?;
        page.wait_for_navigation()
            .await
            .map_err(|err| AdapterError::io(format!("navigation to {url} failed: {err}")))?;
        debug!(url, "page opened");
        Ok(CdpPage::new(page))
    }

    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            warn!(?err, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

/// [`PageAdapter`] over one Chromium tab.
#[derive(Clone)]
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn inner(&self) -> &Page {
        &self.page
    }

    pub async fn goto(&self, url: &str) -> Result<(), AdapterError> {
        self.page
            .goto(url)
            .await
            .map_err(|err| AdapterError::io(format!("navigation to {url} failed: {err}")))?;
        Ok(())
    }

    /// Run `body` with the registry bound to `wm` and decode its return value.
    ///
    /// The result crosses the protocol as a JSON string so `null` and
    /// `undefined` survive as a value.
    async fn eval<T: DeserializeOwned>(&self, body: &str) -> Result<T, AdapterError> {
        let script = format!(
            "(() => {{ const wm = {}; const out = (() => {{ {} }})(); \
             return JSON.stringify(out === undefined ? null : out); }})()",
            REGISTRY_JS, body
        );
        let result = self
            .page
            .evaluate_expression(script)
            .await
            .map_err(classify)?;
        let raw: String = result.into_value().map_err(unexpected)?;
        serde_json::from_str(&raw).map_err(unexpected)
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn unexpected(err: serde_json::Error) -> AdapterError {
    AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("unexpected script result: {err}"))
}

fn classify(err: chromiumoxide::error::CdpError) -> AdapterError {
    let message = err.to_string();
    if message.contains("webminer: stale handle") {
        AdapterError::new(AdapterErrorKind::StaleHandle).with_hint(message)
    } else if message.contains("not a valid selector") || message.contains("SyntaxError") {
        AdapterError::new(AdapterErrorKind::InvalidSelector).with_hint(message)
    } else {
        AdapterError::io(message)
    }
}

#[async_trait]
impl PageAdapter for CdpPage {
    async fn page_url(&self) -> Result<String, AdapterError> {
        self.eval("return location.href;").await
    }

    async fn element_by_id(&self, id: &str) -> Result<Option<ElementHandle>, AdapterError> {
        let body = format!(
            "const el = document.getElementById({}); return el ? wm.handle(el) : null;",
            js_string(id)
        );
        Ok(self.eval::<Option<u64>>(&body).await?.map(ElementHandle))
    }

    async fn query_selector_all(
        &self,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, AdapterError> {
        let body = format!(
            "return Array.from(document.querySelectorAll({})).map((el) => wm.handle(el));",
            js_string(selector)
        );
        let ids: Vec<u64> = self.eval(&body).await?;
        Ok(ids.into_iter().map(ElementHandle).collect())
    }

    async fn all_elements(&self) -> Result<Vec<ElementHandle>, AdapterError> {
        let ids: Vec<u64> = self
            .eval("return Array.from(document.querySelectorAll('*')).map((el) => wm.handle(el));")
            .await?;
        Ok(ids.into_iter().map(ElementHandle).collect())
    }

    async fn text_content(&self, handle: ElementHandle) -> Result<String, AdapterError> {
        let body = format!("return wm.node({}).textContent ?? '';", handle.0);
        self.eval(&body).await
    }

    async fn elements_with_text(
        &self,
        text: &str,
        candidates: Option<&[ElementHandle]>,
    ) -> Result<Vec<ElementHandle>, AdapterError> {
        let scope = match candidates {
            Some(candidates) => {
                let ids: Vec<u64> = candidates.iter().map(|handle| handle.0).collect();
                serde_json::to_string(&ids).map_err(unexpected)?
            }
            None => "null".to_string(),
        };
        let body = format!(
            r#"const wanted = {};
               const scope = {};
               const pool = scope === null
                 ? Array.from(document.querySelectorAll('*'))
                 : scope.map((id) => wm.peek(id)).filter((el) => el);
               return pool
                 .filter((el) => (el.textContent ?? '').trim() === wanted)
                 .map((el) => wm.handle(el));"#,
            js_string(text),
            scope
        );
        let ids: Vec<u64> = self.eval(&body).await?;
        Ok(ids.into_iter().map(ElementHandle).collect())
    }

    async fn snapshot(&self, handle: ElementHandle) -> Result<ElementSnapshot, AdapterError> {
        let body = format!(
            r#"const el = wm.node({});
               const prop = (name) => (typeof el[name] === 'string' ? el[name] : null);
               return {{
                 tagName: el.tagName.toLowerCase(),
                 attributes: Array.from(el.attributes).map((a) => [a.name, a.value]),
                 href: prop('href'),
                 src: prop('src'),
                 value: prop('value'),
                 alt: prop('alt'),
                 textContent: el.textContent ?? '',
                 uniqueSelector: wm.path(el),
               }};"#,
            handle.0
        );
        self.eval(&body).await
    }

    async fn click(&self, handle: ElementHandle) -> Result<(), AdapterError> {
        let body = format!("wm.node({}).click(); return true;", handle.0);
        self.eval::<bool>(&body).await.map(|_| ())
    }

    async fn set_value(&self, handle: ElementHandle, value: &str) -> Result<(), AdapterError> {
        let body = format!(
            "wm.node({}).value = {}; return true;",
            handle.0,
            js_string(value)
        );
        self.eval::<bool>(&body).await.map(|_| ())
    }

    async fn dispatch_event(
        &self,
        handle: ElementHandle,
        event: DomEvent,
    ) -> Result<(), AdapterError> {
        let body = format!(
            "wm.node({}).dispatchEvent(new Event({}, {{ bubbles: {} }})); return true;",
            handle.0,
            js_string(event.name()),
            event.bubbles()
        );
        self.eval::<bool>(&body).await.map(|_| ())
    }

    async fn link_href(&self, handle: ElementHandle) -> Result<Option<String>, AdapterError> {
        let body = format!(
            "const el = wm.node({}); return typeof el.href === 'string' && el.href ? el.href : null;",
            handle.0
        );
        self.eval(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(js_string("line\nbreak"), r#""line\nbreak""#);
    }
}
