//! Facet selection with exclusivity rules.
//!
//! A picked element exposes many facets; the user toggles the ones that
//! should identify it at replay time. `id`, the unique structural path and
//! the text content are each treated as sufficient on their own, so choosing
//! one of them drops everything else, while any other facet can be combined
//! freely but never with an exclusive one.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of a toggleable facet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FacetKey {
    Id,
    UniqueSelector,
    TextContent,
    TagName,
    ClassName(String),
    Attribute(String),
    Href,
    Src,
    Role,
    AriaLabel,
    AriaRoleDescription,
    AriaValueText,
    Value,
    Title,
    Alt,
}

impl FacetKey {
    pub fn is_exclusive(&self) -> bool {
        matches!(
            self,
            FacetKey::Id | FacetKey::UniqueSelector | FacetKey::TextContent
        )
    }
}

impl fmt::Display for FacetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetKey::Id => f.write_str("id"),
            FacetKey::UniqueSelector => f.write_str("unique-selector"),
            FacetKey::TextContent => f.write_str("text"),
            FacetKey::TagName => f.write_str("tag"),
            FacetKey::ClassName(name) => write!(f, "class:{}", name),
            FacetKey::Attribute(name) => write!(f, "attr:{}", name),
            FacetKey::Href => f.write_str("href"),
            FacetKey::Src => f.write_str("src"),
            FacetKey::Role => f.write_str("role"),
            FacetKey::AriaLabel => f.write_str("aria-label"),
            FacetKey::AriaRoleDescription => f.write_str("aria-roledescription"),
            FacetKey::AriaValueText => f.write_str("aria-valuetext"),
            FacetKey::Value => f.write_str("value"),
            FacetKey::Title => f.write_str("title"),
            FacetKey::Alt => f.write_str("alt"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FacetParseError {
    #[error("unknown facet '{0}'")]
    Unknown(String),

    #[error("facet '{0}' needs a name after the colon")]
    MissingName(String),
}

impl FromStr for FacetKey {
    type Err = FacetParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if let Some((prefix, name)) = raw.split_once(':') {
            let name = name.trim();
            if name.is_empty() {
                return Err(FacetParseError::MissingName(raw.to_string()));
            }
            return match prefix {
                "class" => Ok(FacetKey::ClassName(name.to_string())),
                "attr" => Ok(FacetKey::Attribute(name.to_string())),
                _ => Err(FacetParseError::Unknown(raw.to_string())),
            };
        }

        match raw {
            "id" => Ok(FacetKey::Id),
            "unique-selector" | "path" => Ok(FacetKey::UniqueSelector),
            "text" => Ok(FacetKey::TextContent),
            "tag" => Ok(FacetKey::TagName),
            "href" => Ok(FacetKey::Href),
            "src" => Ok(FacetKey::Src),
            "role" => Ok(FacetKey::Role),
            "aria-label" => Ok(FacetKey::AriaLabel),
            "aria-roledescription" => Ok(FacetKey::AriaRoleDescription),
            "aria-valuetext" => Ok(FacetKey::AriaValueText),
            "value" => Ok(FacetKey::Value),
            "title" => Ok(FacetKey::Title),
            "alt" => Ok(FacetKey::Alt),
            _ => Err(FacetParseError::Unknown(raw.to_string())),
        }
    }
}

/// A facet name together with the value captured for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Facet {
    pub key: FacetKey,
    pub value: String,
}

impl Facet {
    pub fn new(key: FacetKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// The facets currently switched on for matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_names: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_role_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_value_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl SelectionSet {
    /// Apply a sequence of toggles starting from an empty selection.
    pub fn from_facets<'a>(facets: impl IntoIterator<Item = &'a Facet>) -> Self {
        facets
            .into_iter()
            .fold(SelectionSet::default(), |selection, facet| {
                selection.toggle(facet)
            })
    }

    pub fn is_empty(&self) -> bool {
        *self == SelectionSet::default()
    }

    pub fn has_exclusive(&self) -> bool {
        self.id.is_some() || self.unique_selector.is_some() || self.text_content.is_some()
    }

    pub fn is_selected(&self, key: &FacetKey) -> bool {
        match key {
            FacetKey::ClassName(name) => self.class_names.iter().any(|c| c == name),
            FacetKey::Attribute(name) => self.attributes.contains_key(name),
            other => self.scalar(other).is_some(),
        }
    }

    /// Return the selection that results from clicking `facet`.
    pub fn toggle(&self, facet: &Facet) -> SelectionSet {
        let mut next = self.clone();

        if facet.key.is_exclusive() {
            if self.is_selected(&facet.key) {
                next.clear_exclusives();
                return next;
            }
            let mut only = SelectionSet::default();
            if let Some(slot) = only.scalar_mut(&facet.key) {
                *slot = Some(facet.value.clone());
            }
            return only;
        }

        next.clear_exclusives();
        match &facet.key {
            FacetKey::ClassName(name) => {
                if let Some(pos) = next.class_names.iter().position(|c| c == name) {
                    next.class_names.remove(pos);
                } else {
                    next.class_names.push(name.clone());
                }
            }
            FacetKey::Attribute(name) => {
                if next.attributes.remove(name).is_none() {
                    next.attributes.insert(name.clone(), facet.value.clone());
                }
            }
            key => {
                if let Some(slot) = next.scalar_mut(key) {
                    *slot = match slot {
                        Some(_) => None,
                        None => Some(facet.value.clone()),
                    };
                }
            }
        }
        next
    }

    fn clear_exclusives(&mut self) {
        self.id = None;
        self.unique_selector = None;
        self.text_content = None;
    }

    fn scalar(&self, key: &FacetKey) -> Option<&String> {
        match key {
            FacetKey::Id => self.id.as_ref(),
            FacetKey::UniqueSelector => self.unique_selector.as_ref(),
            FacetKey::TextContent => self.text_content.as_ref(),
            FacetKey::TagName => self.tag_name.as_ref(),
            FacetKey::Href => self.href.as_ref(),
            FacetKey::Src => self.src.as_ref(),
            FacetKey::Role => self.role.as_ref(),
            FacetKey::AriaLabel => self.aria_label.as_ref(),
            FacetKey::AriaRoleDescription => self.aria_role_description.as_ref(),
            FacetKey::AriaValueText => self.aria_value_text.as_ref(),
            FacetKey::Value => self.value.as_ref(),
            FacetKey::Title => self.title.as_ref(),
            FacetKey::Alt => self.alt.as_ref(),
            FacetKey::ClassName(_) | FacetKey::Attribute(_) => None,
        }
    }

    fn scalar_mut(&mut self, key: &FacetKey) -> Option<&mut Option<String>> {
        match key {
            FacetKey::Id => Some(&mut self.id),
            FacetKey::UniqueSelector => Some(&mut self.unique_selector),
            FacetKey::TextContent => Some(&mut self.text_content),
            FacetKey::TagName => Some(&mut self.tag_name),
            FacetKey::Href => Some(&mut self.href),
            FacetKey::Src => Some(&mut self.src),
            FacetKey::Role => Some(&mut self.role),
            FacetKey::AriaLabel => Some(&mut self.aria_label),
            FacetKey::AriaRoleDescription => Some(&mut self.aria_role_description),
            FacetKey::AriaValueText => Some(&mut self.aria_value_text),
            FacetKey::Value => Some(&mut self.value),
            FacetKey::Title => Some(&mut self.title),
            FacetKey::Alt => Some(&mut self.alt),
            FacetKey::ClassName(_) | FacetKey::Attribute(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facet(key: &str, value: &str) -> Facet {
        Facet::new(key.parse().unwrap(), value)
    }

    #[test]
    fn exclusive_facet_replaces_everything() {
        let selection = SelectionSet::default()
            .toggle(&facet("tag", "button"))
            .toggle(&facet("class:btn", "btn"))
            .toggle(&facet("id", "submit"));

        assert_eq!(selection.id.as_deref(), Some("submit"));
        assert!(selection.tag_name.is_none());
        assert!(selection.class_names.is_empty());

        let switched = selection.toggle(&facet("unique-selector", "body > button"));
        assert!(switched.id.is_none());
        assert_eq!(switched.unique_selector.as_deref(), Some("body > button"));
    }

    #[test]
    fn combinable_facet_clears_exclusives() {
        let selection = SelectionSet::default()
            .toggle(&facet("text", "Submit"))
            .toggle(&facet("role", "button"));

        assert!(!selection.has_exclusive());
        assert_eq!(selection.role.as_deref(), Some("button"));
    }

    #[test]
    fn toggling_selected_exclusive_clears_it() {
        let selection = SelectionSet::default().toggle(&facet("id", "main"));
        let cleared = selection.toggle(&facet("id", "main"));
        assert!(cleared.is_empty());
    }

    #[test]
    fn class_names_toggle_individually() {
        let selection = SelectionSet::default()
            .toggle(&facet("class:btn", "btn"))
            .toggle(&facet("class:primary", "primary"))
            .toggle(&facet("class:btn", "btn"));
        assert_eq!(selection.class_names, vec!["primary".to_string()]);
    }

    #[test]
    fn attributes_toggle_individually() {
        let selection = SelectionSet::default()
            .toggle(&facet("attr:data-test", "save"))
            .toggle(&facet("attr:type", "submit"));
        assert_eq!(selection.attributes.len(), 2);

        let selection = selection.toggle(&facet("attr:type", "submit"));
        assert_eq!(
            selection.attributes.get("data-test").map(String::as_str),
            Some("save")
        );
        assert!(!selection.is_selected(&FacetKey::Attribute("type".into())));
    }

    #[test]
    fn facet_keys_round_trip_through_text() {
        for raw in [
            "id",
            "unique-selector",
            "text",
            "tag",
            "class:btn",
            "attr:data-id",
            "href",
            "aria-roledescription",
            "alt",
        ] {
            let key: FacetKey = raw.parse().unwrap();
            assert_eq!(key.to_string(), raw);
        }
        assert!(matches!(
            "class:".parse::<FacetKey>(),
            Err(FacetParseError::MissingName(_))
        ));
        assert!(matches!(
            "colour".parse::<FacetKey>(),
            Err(FacetParseError::Unknown(_))
        ));
    }

    #[test]
    fn selection_serializes_only_selected_fields() {
        let selection = SelectionSet::default().toggle(&facet("class:btn", "btn"));
        let value = serde_json::to_value(&selection).unwrap();
        assert_eq!(value, serde_json::json!({"classNames": ["btn"]}));
    }
}
