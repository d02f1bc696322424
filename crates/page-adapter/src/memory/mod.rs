//! In-memory page.
//!
//! `MemoryPage` is cheap to clone; clones share the same document, so a test
//! can keep a handle and mutate the page while a resolver polls it.

mod selector;
mod tree;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::trace;
use url::Url;
use webminer_core_types::ElementHandle;

use crate::css;
use crate::errors::{AdapterError, AdapterErrorKind};
use crate::types::{DomEvent, ElementSnapshot};
use crate::PageAdapter;

use tree::{Dom, NodeId};

#[derive(Debug, Clone)]
pub(crate) enum SpecChild {
    Element(ElementSpec),
    Text(String),
}

/// Builder for a subtree to insert into a [`MemoryPage`].
#[derive(Debug, Clone)]
pub struct ElementSpec {
    pub(crate) tag: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<SpecChild>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, classes: &str) -> Self {
        self.attr("class", classes)
    }

    /// Set an attribute, replacing an earlier value in place.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name, value.to_string())),
        }
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(SpecChild::Text(text.to_string()));
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(SpecChild::Element(child));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children
            .extend(children.into_iter().map(SpecChild::Element));
        self
    }
}

/// Something the page was asked to do, kept for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Click(ElementHandle),
    SetValue(ElementHandle, String),
    Event(ElementHandle, DomEvent),
}

#[derive(Clone)]
pub struct MemoryPage {
    dom: Arc<RwLock<Dom>>,
    log: Arc<Mutex<Vec<Interaction>>>,
    html: ElementHandle,
    body: ElementHandle,
}

fn node(handle: ElementHandle) -> NodeId {
    NodeId(handle.0 as usize)
}

fn handle(node: NodeId) -> ElementHandle {
    ElementHandle(node.0 as u64)
}

impl MemoryPage {
    /// Empty `<html><head></head><body></body></html>` document at `url`.
    pub fn new(url: &str) -> Result<Self, AdapterError> {
        let url = Url::parse(url).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("invalid page url '{}': {}", url, err))
        })?;
        let mut dom = Dom::new(url);
        let html = dom.build(
            Dom::ROOT,
            &ElementSpec::new("html").child(ElementSpec::new("head")),
        );
        let body = dom.build(html, &ElementSpec::new("body"));

        Ok(Self {
            dom: Arc::new(RwLock::new(dom)),
            log: Arc::new(Mutex::new(Vec::new())),
            html: handle(html),
            body: handle(body),
        })
    }

    /// Document whose body holds `children`.
    pub fn with_body(
        url: &str,
        children: impl IntoIterator<Item = ElementSpec>,
    ) -> Result<Self, AdapterError> {
        let page = Self::new(url)?;
        for child in children {
            page.append(page.body, child)?;
        }
        Ok(page)
    }

    pub fn html(&self) -> ElementHandle {
        self.html
    }

    pub fn body(&self) -> ElementHandle {
        self.body
    }

    pub fn append(
        &self,
        parent: ElementHandle,
        spec: ElementSpec,
    ) -> Result<ElementHandle, AdapterError> {
        let mut dom = self.dom.write();
        if dom.element(node(parent)).is_none() {
            return Err(AdapterError::stale(parent));
        }
        let created = handle(dom.build(node(parent), &spec));
        trace!(%parent, %created, tag = %spec.tag, "memory page append");
        Ok(created)
    }

    /// Detach an element; its handle stays valid but no query finds it.
    pub fn remove(&self, target: ElementHandle) -> Result<(), AdapterError> {
        let mut dom = self.dom.write();
        if dom.element(node(target)).is_none() {
            return Err(AdapterError::stale(target));
        }
        dom.detach(node(target));
        Ok(())
    }

    pub fn set_attribute(
        &self,
        target: ElementHandle,
        name: &str,
        value: &str,
    ) -> Result<(), AdapterError> {
        let mut dom = self.dom.write();
        let element = dom
            .element_mut(node(target))
            .ok_or_else(|| AdapterError::stale(target))?;
        element.set_attr(&name.to_ascii_lowercase(), value);
        Ok(())
    }

    /// Synchronous `querySelectorAll` over the connected document.
    pub fn select(&self, selector: &str) -> Result<Vec<ElementHandle>, AdapterError> {
        let list = css::parse(selector)
            .map_err(|reason| AdapterError::invalid_selector(selector, reason))?;
        let dom = self.dom.read();
        Ok(dom
            .elements()
            .into_iter()
            .filter(|node| selector::matches_list(&dom, *node, &list))
            .map(handle)
            .collect())
    }

    pub fn value_of(&self, target: ElementHandle) -> Option<String> {
        self.dom.read().value_property(node(target))
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.log.lock().clone()
    }

    pub fn clicks(&self) -> Vec<ElementHandle> {
        self.log
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                Interaction::Click(target) => Some(*target),
                _ => None,
            })
            .collect()
    }

    pub fn events_for(&self, target: ElementHandle) -> Vec<DomEvent> {
        self.log
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                Interaction::Event(h, event) if *h == target => Some(*event),
                _ => None,
            })
            .collect()
    }

    fn ensure_element(&self, target: ElementHandle) -> Result<(), AdapterError> {
        match self.dom.read().element(node(target)) {
            Some(_) => Ok(()),
            None => Err(AdapterError::stale(target)),
        }
    }
}

#[async_trait]
impl PageAdapter for MemoryPage {
    async fn page_url(&self) -> Result<String, AdapterError> {
        Ok(self.dom.read().url().to_string())
    }

    async fn element_by_id(&self, id: &str) -> Result<Option<ElementHandle>, AdapterError> {
        if id.is_empty() {
            return Ok(None);
        }
        let dom = self.dom.read();
        Ok(dom
            .elements()
            .into_iter()
            .find(|node| dom.element(*node).and_then(|e| e.attr("id")) == Some(id))
            .map(handle))
    }

    async fn query_selector_all(
        &self,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, AdapterError> {
        self.select(selector)
    }

    async fn all_elements(&self) -> Result<Vec<ElementHandle>, AdapterError> {
        Ok(self.dom.read().elements().into_iter().map(handle).collect())
    }

    async fn text_content(&self, target: ElementHandle) -> Result<String, AdapterError> {
        self.ensure_element(target)?;
        Ok(self.dom.read().text_content(node(target)))
    }

    async fn elements_with_text(
        &self,
        text: &str,
        candidates: Option<&[ElementHandle]>,
    ) -> Result<Vec<ElementHandle>, AdapterError> {
        let dom = self.dom.read();
        let scan: Vec<NodeId> = match candidates {
            Some(candidates) => candidates
                .iter()
                .map(|target| node(*target))
                .filter(|id| dom.element(*id).is_some())
                .collect(),
            None => dom.elements(),
        };
        Ok(scan
            .into_iter()
            .filter(|id| dom.text_content(*id).trim() == text)
            .map(handle)
            .collect())
    }

    async fn snapshot(&self, target: ElementHandle) -> Result<ElementSnapshot, AdapterError> {
        let dom = self.dom.read();
        let id = node(target);
        let element = dom.element(id).ok_or_else(|| AdapterError::stale(target))?;

        Ok(ElementSnapshot {
            tag_name: element.tag.clone(),
            attributes: element.attributes.clone(),
            href: dom.href_property(id),
            src: dom.src_property(id),
            value: dom.value_property(id),
            alt: dom.alt_property(id),
            text_content: dom.text_content(id),
            unique_selector: selector::unique_selector(&dom, id),
        })
    }

    async fn click(&self, target: ElementHandle) -> Result<(), AdapterError> {
        self.ensure_element(target)?;
        self.log.lock().push(Interaction::Click(target));
        Ok(())
    }

    async fn set_value(&self, target: ElementHandle, value: &str) -> Result<(), AdapterError> {
        {
            let mut dom = self.dom.write();
            let element = dom
                .element_mut(node(target))
                .ok_or_else(|| AdapterError::stale(target))?;
            element.value = Some(value.to_string());
        }
        self.log
            .lock()
            .push(Interaction::SetValue(target, value.to_string()));
        Ok(())
    }

    async fn dispatch_event(
        &self,
        target: ElementHandle,
        event: DomEvent,
    ) -> Result<(), AdapterError> {
        self.ensure_element(target)?;
        self.log.lock().push(Interaction::Event(target, event));
        Ok(())
    }

    async fn link_href(&self, target: ElementHandle) -> Result<Option<String>, AdapterError> {
        self.ensure_element(target)?;
        Ok(self
            .dom
            .read()
            .href_property(node(target))
            .filter(|href| !href.is_empty()))
    }
}
