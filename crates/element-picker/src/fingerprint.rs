//! Element fingerprints.

use std::collections::BTreeMap;

use page_adapter::{AdapterError, ElementSnapshot, PageAdapter};
use serde::{Deserialize, Serialize};
use tracing::debug;
use webminer_core_types::{ElementHandle, Facet, FacetKey};

/// Longest text content kept in a fingerprint, in characters.
pub const TEXT_LIMIT: usize = 30;

/// Identifying facets of one picked element.
///
/// Immutable once captured; picking again produces a new fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_names: Vec<String>,
    /// Every attribute except `id` and `class`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_role_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_value_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Trimmed and cut to [`TEXT_LIMIT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// The element's text was longer than [`TEXT_LIMIT`]. The kept prefix
    /// cannot match by equality, so it is not offered as a facet.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub text_truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_selector: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Build a fingerprint from a snapshot. Never fails; missing facets are `None`.
///
/// `href` and `src` prefer the attribute text over the resolved property so
/// that a selected facet matches the attribute selector it synthesizes to.
pub fn fingerprint(snapshot: &ElementSnapshot) -> Fingerprint {
    let mut class_names: Vec<String> = Vec::new();
    if let Some(list) = snapshot.attribute("class") {
        for class in list.split_ascii_whitespace() {
            if !class_names.iter().any(|c| c == class) {
                class_names.push(class.to_string());
            }
        }
    }

    let attributes = snapshot
        .attributes
        .iter()
        .filter(|(name, _)| name != "id" && name != "class")
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let full = snapshot.text_content.trim();
    let text: String = full.chars().take(TEXT_LIMIT).collect();
    let text_truncated = text.len() < full.len();

    Fingerprint {
        tag_name: snapshot.tag_name.to_ascii_lowercase(),
        id: non_empty(snapshot.attribute("id")),
        class_names,
        attributes,
        role: non_empty(snapshot.attribute("role")),
        aria_label: non_empty(snapshot.attribute("aria-label")),
        aria_role_description: non_empty(snapshot.attribute("aria-roledescription")),
        aria_value_text: non_empty(snapshot.attribute("aria-valuetext")),
        href: non_empty(snapshot.attribute("href")).or_else(|| non_empty(snapshot.href.as_deref())),
        src: non_empty(snapshot.attribute("src")).or_else(|| non_empty(snapshot.src.as_deref())),
        value: non_empty(snapshot.value.as_deref()),
        title: non_empty(snapshot.attribute("title")),
        alt: non_empty(snapshot.alt.as_deref()).or_else(|| non_empty(snapshot.attribute("alt"))),
        text_content: Some(text).filter(|t| !t.is_empty()),
        text_truncated,
        unique_selector: non_empty(snapshot.unique_selector.as_deref()),
    }
}

/// Snapshot `handle` on `page` and fingerprint it.
pub async fn capture(
    page: &dyn PageAdapter,
    handle: ElementHandle,
) -> Result<Fingerprint, AdapterError> {
    let snapshot = page.snapshot(handle).await?;
    let fingerprint = fingerprint(&snapshot);
    debug!(%handle, tag = %fingerprint.tag_name, "element fingerprinted");
    Ok(fingerprint)
}

impl Fingerprint {
    /// Every facet with a value, in the order a picker lists them.
    pub fn facets(&self) -> Vec<Facet> {
        fn push(out: &mut Vec<Facet>, key: FacetKey, value: Option<&String>) {
            if let Some(value) = value {
                out.push(Facet::new(key, value.clone()));
            }
        }

        let mut out = Vec::new();
        push(&mut out, FacetKey::Id, self.id.as_ref());
        push(&mut out, FacetKey::UniqueSelector, self.unique_selector.as_ref());
        if !self.text_truncated {
            push(&mut out, FacetKey::TextContent, self.text_content.as_ref());
        }
        if !self.tag_name.is_empty() {
            push(&mut out, FacetKey::TagName, Some(&self.tag_name));
        }
        for class in &self.class_names {
            push(&mut out, FacetKey::ClassName(class.clone()), Some(class));
        }
        for (name, value) in &self.attributes {
            push(&mut out, FacetKey::Attribute(name.clone()), Some(value));
        }
        push(&mut out, FacetKey::Href, self.href.as_ref());
        push(&mut out, FacetKey::Src, self.src.as_ref());
        push(&mut out, FacetKey::Role, self.role.as_ref());
        push(&mut out, FacetKey::AriaLabel, self.aria_label.as_ref());
        push(&mut out, FacetKey::AriaRoleDescription, self.aria_role_description.as_ref());
        push(&mut out, FacetKey::AriaValueText, self.aria_value_text.as_ref());
        push(&mut out, FacetKey::Value, self.value.as_ref());
        push(&mut out, FacetKey::Title, self.title.as_ref());
        push(&mut out, FacetKey::Alt, self.alt.as_ref());
        out
    }

    /// The facet named `key`, if this element has a value for it.
    pub fn facet(&self, key: &FacetKey) -> Option<Facet> {
        self.facets().into_iter().find(|facet| &facet.key == key)
    }
}
