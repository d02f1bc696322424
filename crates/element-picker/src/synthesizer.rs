//! Selection → query descriptors.
//!
//! Rules, first match wins:
//! 1. a selected id becomes a single by-id lookup;
//! 2. a selected structural path becomes a single CSS query;
//! 3. otherwise the combinable facets form one compound CSS query, and a
//!    selected text content adds an independent text-equality descriptor.

use page_adapter::css::{escape_ident, escape_string};
use webminer_core_types::{QueryDescriptor, SelectionSet, StepElement};

use crate::fingerprint::Fingerprint;

/// Descriptors for `selection` on its own.
pub fn synthesize(selection: &SelectionSet) -> Vec<QueryDescriptor> {
    synthesize_with_anchor(selection, None)
}

/// Descriptors for `selection` made on the element `fingerprint` describes.
///
/// A compound query is anchored on the element's tag even when the tag
/// facet itself is not selected, so `.btn` picked on a `<button>` becomes
/// `button.btn`.
pub fn synthesize_for(fingerprint: &Fingerprint, selection: &SelectionSet) -> Vec<QueryDescriptor> {
    let anchor = Some(fingerprint.tag_name.as_str()).filter(|tag| !tag.is_empty());
    synthesize_with_anchor(selection, anchor)
}

/// Wrap [`synthesize_for`] into the persisted form; `None` when nothing was
/// selected.
pub fn step_element(fingerprint: &Fingerprint, selection: &SelectionSet) -> Option<StepElement> {
    let selectors = synthesize_for(fingerprint, selection);
    (!selectors.is_empty()).then(|| StepElement::new(selectors))
}

fn synthesize_with_anchor(selection: &SelectionSet, anchor: Option<&str>) -> Vec<QueryDescriptor> {
    if let Some(id) = &selection.id {
        return vec![QueryDescriptor::by_id(id.clone())];
    }
    if let Some(path) = &selection.unique_selector {
        return vec![QueryDescriptor::css(path.clone())];
    }

    let mut descriptors = Vec::new();
    if let Some(compound) = compound_selector(selection, anchor) {
        descriptors.push(QueryDescriptor::css(compound));
    }
    if let Some(text) = &selection.text_content {
        descriptors.push(QueryDescriptor::text(text.clone()));
    }
    descriptors
}

fn compound_selector(selection: &SelectionSet, anchor: Option<&str>) -> Option<String> {
    let mut qualifiers = String::new();

    for class in &selection.class_names {
        qualifiers.push('.');
        qualifiers.push_str(&escape_ident(class));
    }
    for (name, value) in &selection.attributes {
        push_attribute(&mut qualifiers, name, value);
    }

    let named = [
        ("href", &selection.href),
        ("src", &selection.src),
        ("role", &selection.role),
        ("alt", &selection.alt),
        ("value", &selection.value),
        ("title", &selection.title),
        ("aria-label", &selection.aria_label),
        ("aria-roledescription", &selection.aria_role_description),
        ("aria-valuetext", &selection.aria_value_text),
    ];
    for (name, value) in named {
        if let Some(value) = value {
            push_attribute(&mut qualifiers, name, value);
        }
    }

    let tag = match (&selection.tag_name, qualifiers.is_empty()) {
        (Some(tag), _) => Some(tag.as_str()),
        (None, false) => anchor,
        (None, true) => None,
    };

    match tag {
        Some(tag) => Some(format!("{}{}", escape_ident(tag), qualifiers)),
        None if qualifiers.is_empty() => None,
        None => Some(qualifiers),
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push('[');
    out.push_str(&escape_ident(name));
    out.push_str("=\"");
    out.push_str(&escape_string(value));
    out.push_str("\"]");
}

#[cfg(test)]
mod tests {
    use super::*;
    use webminer_core_types::{Facet, FacetKey, SearchApi};

    fn button() -> Fingerprint {
        Fingerprint {
            tag_name: "button".into(),
            id: Some("save".into()),
            class_names: vec!["btn".into(), "primary".into()],
            text_content: Some("Save".into()),
            unique_selector: Some("#form > button:nth-child(3)".into()),
            role: Some("button".into()),
            ..Fingerprint::default()
        }
    }

    fn select(fp: &Fingerprint, keys: &[&str]) -> SelectionSet {
        let facets: Vec<Facet> = keys
            .iter()
            .map(|raw| fp.facet(&raw.parse::<FacetKey>().unwrap()).unwrap())
            .collect();
        SelectionSet::from_facets(&facets)
    }

    #[test]
    fn test_classes_anchor_on_tag() {
        let fp = button();
        let selection = SelectionSet {
            class_names: vec!["btn".into(), "primary".into()],
            ..SelectionSet::default()
        };
        assert_eq!(
            synthesize_for(&fp, &selection),
            vec![QueryDescriptor::css("button.btn.primary")]
        );
        assert_eq!(synthesize(&selection), vec![QueryDescriptor::css(".btn.primary")]);
    }

    #[test]
    fn test_id_short_circuits() {
        let fp = button();
        let selection = SelectionSet {
            id: Some("save".into()),
            class_names: vec!["btn".into()],
            text_content: Some("Save".into()),
            ..SelectionSet::default()
        };
        assert_eq!(
            synthesize_for(&fp, &selection),
            vec![QueryDescriptor::by_id("save")]
        );
    }

    #[test]
    fn test_unique_path_never_combines() {
        let fp = button();
        let selection = SelectionSet {
            unique_selector: fp.unique_selector.clone(),
            tag_name: Some("button".into()),
            role: Some("button".into()),
            text_content: Some("Save".into()),
            ..SelectionSet::default()
        };
        let descriptors = synthesize_for(&fp, &selection);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].search_api, SearchApi::CssQuery);
        assert_eq!(descriptors[0].query_string, "#form > button:nth-child(3)");
    }

    #[test]
    fn test_text_is_a_separate_descriptor() {
        let fp = button();
        assert_eq!(
            synthesize_for(&fp, &select(&fp, &["text"])),
            vec![QueryDescriptor::text("Save")]
        );

        let both = SelectionSet {
            class_names: vec!["btn".into()],
            text_content: Some("Save".into()),
            ..SelectionSet::default()
        };
        assert_eq!(
            synthesize_for(&fp, &both),
            vec![QueryDescriptor::css("button.btn"), QueryDescriptor::text("Save")]
        );
    }

    #[test]
    fn test_attribute_order_and_escaping() {
        let selection = SelectionSet {
            tag_name: Some("a".into()),
            attributes: [("data-x".to_string(), "say \"hi\"".to_string())].into(),
            aria_label: Some("Next".into()),
            href: Some("/p?a=1".into()),
            role: Some("link".into()),
            ..SelectionSet::default()
        };
        assert_eq!(
            synthesize(&selection),
            vec![QueryDescriptor::css(
                r#"a[data-x="say \"hi\""][href="/p?a=1"][role="link"][aria-label="Next"]"#
            )]
        );
    }

    #[test]
    fn test_empty_selection_synthesizes_nothing() {
        let fp = button();
        assert!(synthesize_for(&fp, &SelectionSet::default()).is_empty());
        assert!(step_element(&fp, &SelectionSet::default()).is_none());
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let fp = button();
        let selection = select(&fp, &["class:primary", "role", "tag"]);
        assert_eq!(synthesize_for(&fp, &selection), synthesize_for(&fp, &selection));
        assert_eq!(
            synthesize_for(&fp, &selection),
            vec![QueryDescriptor::css(r#"button.primary[role="button"]"#)]
        );
    }
}
