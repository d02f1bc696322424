use crate::css::{escape_ident, Combinator, ComplexSelector, Compound, Pseudo, SelectorList};

use super::tree::{Dom, NodeId};

pub(crate) fn matches_list(dom: &Dom, node: NodeId, list: &SelectorList) -> bool {
    list.selectors
        .iter()
        .any(|selector| matches_complex(dom, node, selector))
}

fn matches_complex(dom: &Dom, node: NodeId, selector: &ComplexSelector) -> bool {
    match selector.parts.len() {
        0 => false,
        len => matches_from(dom, node, &selector.parts, len - 1),
    }
}

/// Match `parts[..=index]` with `parts[index]` anchored on `node`.
fn matches_from(
    dom: &Dom,
    node: NodeId,
    parts: &[(Combinator, Compound)],
    index: usize,
) -> bool {
    let (combinator, compound) = &parts[index];
    if !matches_compound(dom, node, compound) {
        return false;
    }
    if index == 0 {
        return true;
    }

    match combinator {
        Combinator::Child => dom
            .parent_element(node)
            .map(|parent| matches_from(dom, parent, parts, index - 1))
            .unwrap_or(false),
        Combinator::Descendant => {
            let mut ancestor = dom.parent_element(node);
            while let Some(current) = ancestor {
                if matches_from(dom, current, parts, index - 1) {
                    return true;
                }
                ancestor = dom.parent_element(current);
            }
            false
        }
    }
}

fn matches_compound(dom: &Dom, node: NodeId, compound: &Compound) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };

    if let Some(tag) = &compound.tag {
        if &element.tag != tag {
            return false;
        }
    }
    if !compound.ids.iter().all(|id| element.attr("id") == Some(id.as_str())) {
        return false;
    }
    if !compound.classes.iter().all(|class| element.has_class(class)) {
        return false;
    }
    let attributes_match = compound.attributes.iter().all(|wanted| {
        match (element.attr(&wanted.name), &wanted.value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        }
    });
    if !attributes_match {
        return false;
    }

    compound.pseudos.iter().all(|pseudo| {
        let Some((child_index, type_index)) = dom.sibling_position(node) else {
            return false;
        };
        match pseudo {
            Pseudo::NthChild(n) => child_index == *n,
            Pseudo::NthOfType(n) => type_index == *n,
        }
    })
}

/// Structural path from the nearest uniquely identified ancestor (or
/// `html`) down to `node`. `None` once the node has left the document.
pub(crate) fn unique_selector(dom: &Dom, node: NodeId) -> Option<String> {
    if !dom.is_connected(node) {
        return None;
    }

    let mut segments = Vec::new();
    let mut current = node;
    loop {
        let element = dom.element(current)?;
        if let Some(id) = element.attr("id").filter(|id| !id.is_empty()) {
            if dom.count_id(id) == 1 {
                segments.push(format!("#{}", escape_ident(id)));
                break;
            }
        }
        if element.tag == "html" {
            segments.push("html".to_string());
            break;
        }

        let (position, _) = dom.sibling_position(current)?;
        segments.push(format!("{}:nth-child({})", escape_ident(&element.tag), position));
        match dom.parent_element(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    segments.reverse();
    Some(segments.join(" > "))
}
