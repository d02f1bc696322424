//! Arena storage for the in-memory DOM.

use url::Url;

use super::ElementSpec;
use super::SpecChild;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attributes: Vec<(String, String)>,
    /// Value property once script code has assigned one.
    pub(crate) value: Option<String>,
}

impl ElementData {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|list| list.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn is_form_control(&self) -> bool {
        matches!(
            self.tag.as_str(),
            "input" | "textarea" | "select" | "button" | "option" | "output" | "data"
        )
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
    url: Url,
}

impl Dom {
    pub(crate) const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(url: Url) -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            url,
        }
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    fn create_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Materialise `spec` and its subtree under `parent`.
    pub(crate) fn build(&mut self, parent: NodeId, spec: &ElementSpec) -> NodeId {
        let node = self.create_node(
            Some(parent),
            NodeKind::Element(ElementData {
                tag: spec.tag.clone(),
                attributes: spec.attributes.clone(),
                value: None,
            }),
        );
        for child in &spec.children {
            match child {
                SpecChild::Element(child) => {
                    self.build(node, child);
                }
                SpecChild::Text(text) => {
                    self.create_node(Some(node), NodeKind::Text(text.clone()));
                }
            }
        }
        node
    }

    pub(crate) fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes.get(node.0).and_then(|n| n.parent) {
            self.nodes[parent.0].children.retain(|child| *child != node);
            self.nodes[node.0].parent = None;
        }
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node.0)?.parent?;
        self.element(parent).map(|_| parent)
    }

    pub(crate) fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == Self::ROOT {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|n| n.parent);
        }
        false
    }

    /// Connected elements in document order.
    pub(crate) fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }

    pub(crate) fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|child| self.element(*child).is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 1-based `(nth-child, nth-of-type)` position among element siblings.
    pub(crate) fn sibling_position(&self, node: NodeId) -> Option<(usize, usize)> {
        let parent = self.nodes.get(node.0)?.parent?;
        let tag = &self.element(node)?.tag;
        let mut child_index = 0;
        let mut type_index = 0;
        for sibling in self.element_children(parent) {
            child_index += 1;
            if self.element(sibling).map(|e| &e.tag == tag).unwrap_or(false) {
                type_index += 1;
            }
            if sibling == node {
                return Some((child_index, type_index));
            }
        }
        None
    }

    pub(crate) fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.nodes.get(node.0) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Document | NodeKind::Element(_) => {
                for child in &entry.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    pub(crate) fn count_id(&self, id: &str) -> usize {
        self.elements()
            .into_iter()
            .filter(|node| self.element(*node).and_then(|e| e.attr("id")) == Some(id))
            .count()
    }

    fn resolve(&self, raw: &str) -> String {
        self.url
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string())
    }

    pub(crate) fn href_property(&self, node: NodeId) -> Option<String> {
        let element = self.element(node)?;
        match element.tag.as_str() {
            "a" | "area" | "link" | "base" => {
                Some(element.attr("href").map(|raw| self.resolve(raw)).unwrap_or_default())
            }
            _ => None,
        }
    }

    pub(crate) fn src_property(&self, node: NodeId) -> Option<String> {
        let element = self.element(node)?;
        match element.tag.as_str() {
            "img" | "script" | "iframe" | "video" | "audio" | "source" | "embed" | "track"
            | "input" => Some(element.attr("src").map(|raw| self.resolve(raw)).unwrap_or_default()),
            _ => None,
        }
    }

    pub(crate) fn alt_property(&self, node: NodeId) -> Option<String> {
        let element = self.element(node)?;
        match element.tag.as_str() {
            "img" | "area" | "input" => Some(element.attr("alt").unwrap_or_default().to_string()),
            _ => None,
        }
    }

    pub(crate) fn value_property(&self, node: NodeId) -> Option<String> {
        let element = self.element(node)?;
        if let Some(value) = &element.value {
            return Some(value.clone());
        }
        if !element.is_form_control() {
            return None;
        }
        if element.tag == "textarea" {
            return Some(self.text_content(node));
        }
        Some(element.attr("value").unwrap_or_default().to_string())
    }
}
