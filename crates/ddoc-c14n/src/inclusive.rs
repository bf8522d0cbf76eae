#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 (C14N 1.0) of a whole document.
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//!
//! The canonical form:
//! - renders every element with an explicit start and end tag
//! - emits a namespace declaration only where it differs from the one in
//!   effect on the nearest output ancestor, default namespace first, then by
//!   prefix
//! - sorts attributes by (namespace URI, local name), unqualified first
//! - escapes text and attribute values
//! - drops whitespace outside the document element and, unless asked for,
//!   comments

use crate::escape;
use ddoc_core::ns;
use std::cmp::Ordering;
use std::collections::BTreeMap;

type NsMap = BTreeMap<String, String>;

/// Canonicalize a parsed document.
pub fn canonicalize(doc: &roxmltree::Document<'_>, with_comments: bool) -> Vec<u8> {
    let mut writer = Writer {
        source: doc.input_text(),
        with_comments,
        out: Vec::new(),
    };
    for child in doc.root().children() {
        writer.top_level(child);
    }
    writer.out
}

struct Writer<'s> {
    source: &'s str,
    with_comments: bool,
    out: Vec<u8>,
}

impl Writer<'_> {
    fn push(&mut self, s: &str) {
        self.out.extend_from_slice(s.as_bytes());
    }

    /// Children of the document node. Comments and PIs before the document
    /// element are followed by a newline, those after it are preceded by one.
    fn top_level(&mut self, node: roxmltree::Node<'_, '_>) {
        match node.node_type() {
            roxmltree::NodeType::Element => self.element(node, &NsMap::new()),
            roxmltree::NodeType::Comment | roxmltree::NodeType::PI => {
                if node.is_comment() && !self.with_comments {
                    return;
                }
                let after_root = node.prev_siblings().any(|s| s.is_element());
                if after_root {
                    self.out.push(b'\n');
                }
                self.leaf(node);
                if !after_root {
                    self.out.push(b'\n');
                }
            }
            _ => {}
        }
    }

    fn content(&mut self, node: roxmltree::Node<'_, '_>, rendered: &NsMap) {
        match node.node_type() {
            roxmltree::NodeType::Element => self.element(node, rendered),
            roxmltree::NodeType::Text => {
                let text = escape::escape_text(node.text().unwrap_or(""));
                self.push(&text);
            }
            roxmltree::NodeType::Comment if !self.with_comments => {}
            _ => self.leaf(node),
        }
    }

    fn leaf(&mut self, node: roxmltree::Node<'_, '_>) {
        match node.node_type() {
            roxmltree::NodeType::Comment => {
                self.push("<!--");
                self.push(node.text().unwrap_or(""));
                self.push("-->");
            }
            roxmltree::NodeType::PI => {
                if let Some(pi) = node.pi() {
                    self.push("<?");
                    self.push(pi.target);
                    if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                        self.push(" ");
                        self.push(&escape::escape_pi(value));
                    }
                    self.push("?>");
                }
            }
            _ => {}
        }
    }

    fn element(&mut self, node: roxmltree::Node<'_, '_>, rendered: &NsMap) {
        let in_scope = in_scope_namespaces(node);
        let empty = String::new();

        let mut decls: Vec<(&String, &String)> = in_scope
            .iter()
            .filter(|(prefix, uri)| rendered.get(*prefix) != Some(*uri))
            .collect();
        // An inherited non-empty default namespace that is no longer in
        // effect has to be undeclared.
        let undeclare_default = rendered.get("").is_some_and(|u| !u.is_empty())
            && !in_scope.contains_key("");
        if undeclare_default {
            decls.push((&empty, &empty));
        }
        decls.sort_by(|a, b| cmp_prefix(a.0, b.0));

        let mut attrs: Vec<(String, &str, String, &str)> = node
            .attributes()
            .map(|a| {
                let uri = a.namespace().unwrap_or("");
                let qname = match attribute_prefix(node, a.namespace()) {
                    Some(prefix) => format!("{prefix}:{}", a.name()),
                    None => a.name().to_owned(),
                };
                (uri.to_owned(), a.name(), qname, a.value())
            })
            .collect();
        attrs.sort_by(|a, b| cmp_attr((&a.0, a.1), (&b.0, b.1)));

        let name = self.qualified_name(node);
        self.push("<");
        self.push(&name);
        for (prefix, uri) in &decls {
            if prefix.is_empty() {
                self.push(" xmlns=\"");
            } else {
                self.push(" xmlns:");
                self.push(prefix);
                self.push("=\"");
            }
            self.push(&escape::escape_attr(uri));
            self.push("\"");
        }
        for (_, _, qname, value) in &attrs {
            self.push(" ");
            self.push(qname);
            self.push("=\"");
            self.push(&escape::escape_attr(value));
            self.push("\"");
        }
        self.push(">");

        let mut child_rendered = rendered.clone();
        for (prefix, uri) in &decls {
            child_rendered.insert((*prefix).clone(), (*uri).clone());
        }
        for child in node.children() {
            self.content(child, &child_rendered);
        }

        self.push("</");
        self.push(&name);
        self.push(">");
    }

    /// The element name exactly as written in the source, prefix included.
    fn qualified_name(&self, node: roxmltree::Node<'_, '_>) -> String {
        let start = node.range().start + 1;
        let raw = self
            .source
            .get(start..)
            .and_then(|rest| {
                rest.split(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                    .next()
            })
            .unwrap_or("");
        if raw.is_empty() {
            node.tag_name().name().to_owned()
        } else {
            raw.to_owned()
        }
    }
}

/// Namespaces in scope at `node`, without the implicit `xml` binding.
fn in_scope_namespaces(node: roxmltree::Node<'_, '_>) -> NsMap {
    let mut map = NsMap::new();
    for ns in node.namespaces() {
        let prefix = ns.name().unwrap_or("");
        if prefix == "xml" || (prefix.is_empty() && ns.uri().is_empty()) {
            continue;
        }
        map.insert(prefix.to_owned(), ns.uri().to_owned());
    }
    map
}

fn attribute_prefix<'a>(node: roxmltree::Node<'a, '_>, uri: Option<&str>) -> Option<&'a str> {
    let uri = uri?;
    if uri == ns::XML {
        return Some("xml");
    }
    node.namespaces()
        .find(|n| n.uri() == uri && n.name().is_some())
        .and_then(|n| n.name())
}

fn cmp_prefix(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.cmp(b),
    }
}

fn cmp_attr(a: (&str, &str), b: (&str, &str)) -> Ordering {
    match (a.0.is_empty(), b.0.is_empty()) {
        (true, true) => a.1.cmp(b.1),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.0.cmp(b.0).then(a.1.cmp(b.1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(xml: &str, with_comments: bool) -> String {
        let doc = roxmltree::Document::parse(xml).unwrap();
        String::from_utf8(canonicalize(&doc, with_comments)).unwrap()
    }

    #[test]
    fn test_attribute_order_and_empty_elements() {
        assert_eq!(
            c14n(r#"<root><a b="1" a="2"/></root>"#, false),
            r#"<root><a a="2" b="1"></a></root>"#
        );
    }

    #[test]
    fn test_namespace_declared_once() {
        let out = c14n(
            r#"<r xmlns="http://d" xmlns:b="http://b" xmlns:a="http://a"><a:c xmlns:a="http://a"/></r>"#,
            false,
        );
        assert_eq!(
            out,
            r#"<r xmlns="http://d" xmlns:a="http://a" xmlns:b="http://b"><a:c></a:c></r>"#
        );
    }

    #[test]
    fn test_default_namespace_undeclared() {
        let out = c14n(r#"<r xmlns="http://d"><c xmlns=""/></r>"#, false);
        assert_eq!(out, r#"<r xmlns="http://d"><c xmlns=""></c></r>"#);
    }

    #[test]
    fn test_whitespace_and_escaping_kept() {
        let out = c14n("<r>\n<a x=\"&quot;\">1 &lt; 2</a>\n</r>", false);
        assert_eq!(out, "<r>\n<a x=\"&quot;\">1 &lt; 2</a>\n</r>");
    }

    #[test]
    fn test_comments() {
        let xml = "<!--top--><r><!--inner--></r>";
        assert_eq!(c14n(xml, false), "<r></r>");
        assert_eq!(c14n(xml, true), "<!--top-->\n<r><!--inner--></r>");
    }

    #[test]
    fn test_namespaced_attribute() {
        let out = c14n(r#"<r xmlns:p="http://p" p:z="1" a="2"/>"#, false);
        assert_eq!(out, r#"<r xmlns:p="http://p" a="2" p:z="1"></r>"#);
    }
}
