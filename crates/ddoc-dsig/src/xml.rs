#![forbid(unsafe_code)]

//! Element lookup helpers shared by the readers.
//!
//! Fragments produced by `to_xml` carry no namespace on `Reference`, so a
//! name matches when the element is unqualified or in the DSig namespace.

use ddoc_core::{ns, Error};

pub(crate) fn is_dsig(node: &roxmltree::Node<'_, '_>, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && matches!(node.tag_name().namespace(), None | Some(ns::DSIG))
}

pub(crate) fn find_child<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    parent.children().find(|n| is_dsig(n, local_name))
}

pub(crate) fn find_children<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    parent.children().filter(|n| is_dsig(n, local_name)).collect()
}

/// First element named `local_name`, the root element included.
pub(crate) fn find_element<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    local_name: &str,
) -> Result<roxmltree::Node<'a, 'input>, Error> {
    doc.descendants()
        .find(|n| is_dsig(n, local_name))
        .ok_or_else(|| Error::MissingElement(local_name.into()))
}

pub(crate) fn parse(xml: &str) -> Result<roxmltree::Document<'_>, Error> {
    roxmltree::Document::parse(xml).map_err(|e: roxmltree::Error| Error::XmlParse(e.to_string()))
}

/// Source text of `node` as a standalone document.
///
/// Namespace declarations the element inherits from its ancestors are
/// copied onto its start tag, so canonicalizing the fragment gives the same
/// bytes as canonicalizing the element in place.
pub(crate) fn standalone_fragment(node: roxmltree::Node<'_, '_>, source: &str) -> String {
    let range = node.range();
    let text = source.get(range.clone()).unwrap_or("");

    let parent = node.parent().filter(|p| p.is_element());
    let inherited: Vec<(Option<&str>, &str)> = match parent {
        Some(parent) => node
            .namespaces()
            .filter(|n| n.name() != Some("xml") && !n.uri().is_empty())
            .filter(|n| parent.namespaces().any(|p| p.name() == n.name() && p.uri() == n.uri()))
            .filter(|n| !declares_itself(text, n.name()))
            .map(|n| (n.name(), n.uri()))
            .collect(),
        None => Vec::new(),
    };
    if inherited.is_empty() {
        return text.to_owned();
    }

    let name_end = text
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_whitespace() || *c == '>' || *c == '/')
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let mut out = String::with_capacity(text.len() + 64);
    out.push_str(&text[..name_end]);
    for (prefix, uri) in inherited {
        match prefix {
            Some(p) => out.push_str(&format!(" xmlns:{p}=\"{uri}\"")),
            None => out.push_str(&format!(" xmlns=\"{uri}\"")),
        }
    }
    out.push_str(&text[name_end..]);
    out
}

/// Whether the start tag at the beginning of `text` declares `prefix` itself.
fn declares_itself(text: &str, prefix: Option<&str>) -> bool {
    let start_tag = text.split('>').next().unwrap_or("");
    let needle = match prefix {
        Some(p) => format!("xmlns:{p}="),
        None => "xmlns=".to_owned(),
    };
    start_tag.contains(&needle)
}
