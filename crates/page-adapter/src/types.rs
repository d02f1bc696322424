use serde::{Deserialize, Serialize};

/// Read-only copy of everything the fingerprinter needs from one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Lower-case tag name.
    pub tag_name: String,
    /// Attributes in DOM order.
    pub attributes: Vec<(String, String)>,
    /// `href` property, resolved against the document URL.
    pub href: Option<String>,
    /// `src` property, resolved against the document URL.
    pub src: Option<String>,
    /// Current `value` property of form controls.
    pub value: Option<String>,
    /// `alt` property of images and image inputs.
    pub alt: Option<String>,
    /// Untrimmed text content.
    pub text_content: String,
    /// Structural CSS path that was unique when the snapshot was taken.
    pub unique_selector: Option<String>,
}

impl ElementSnapshot {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Synthetic events the executor fires after changing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
}

impl DomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
        }
    }

    /// Both events bubble so delegated framework listeners see them.
    pub fn bubbles(&self) -> bool {
        true
    }
}
