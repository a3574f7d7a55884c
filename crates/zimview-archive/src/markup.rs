//! Element access for archived HTML
//!
//! Documents are parsed with html5ever into an `RcDom`, so only real elements
//! are seen: comments and script bodies never produce tags, and attribute
//! values arrive with character references decoded. Rewrites serialize the
//! edited tree; a document with nothing to change is returned as written.

use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{Attribute as DomAttribute, LocalName, QualName, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// One attribute of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lower-cased name
    pub name: String,
    /// Decoded value; empty for attributes written without one
    pub value: String,
}

/// Start tag of an element found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lower-cased tag name
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Tag {
    fn from_node(handle: &Handle) -> Option<Self> {
        let NodeData::Element { name, attrs, .. } = &handle.data else {
            return None;
        };
        let attributes = attrs
            .borrow()
            .iter()
            .map(|attr| Attribute {
                name: attr.name.local.to_string(),
                value: attr.value.to_string(),
            })
            .collect();
        Some(Self {
            name: name.local.to_string(),
            attributes,
        })
    }

    /// Attribute value by (case-insensitive) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }
}

fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

fn is_element(name: &QualName, wanted: &str) -> bool {
    let namespace: &str = &name.ns;
    let local: &str = &name.local;
    namespace == HTML_NAMESPACE && local.eq_ignore_ascii_case(wanted)
}

fn is_attribute(attr: &DomAttribute, wanted: &str) -> bool {
    let local: &str = &attr.name.local;
    local.eq_ignore_ascii_case(wanted)
}

/// HTML elements named `name` at or below `handle`, in document order
fn collect(handle: &Handle, name: &str, found: &mut Vec<Handle>) {
    if let NodeData::Element { name: element, .. } = &handle.data {
        if is_element(element, name) {
            found.push(Rc::clone(handle));
        }
    }
    for child in handle.children.borrow().iter() {
        collect(child, name, found);
    }
}

fn elements(dom: &RcDom, name: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    collect(&dom.document, name, &mut found);
    found
}

fn render(dom: &RcDom, original: &str) -> String {
    let document: SerializableHandle = dom.document.clone().into();
    let mut bytes = Vec::with_capacity(original.len());
    match serialize(&mut bytes, &document, SerializeOpts::default()) {
        Ok(()) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            tracing::warn!("Cannot serialize rewritten markup: {}", err);
            original.to_string()
        }
    }
}

/// All elements named `name`, in document order
pub fn scan(html: &str, name: &str) -> Vec<Tag> {
    let dom = parse(html);
    elements(&dom, name).iter().filter_map(Tag::from_node).collect()
}

/// Rename attribute `from` to `to` on every `tag` element.
///
/// Elements that already carry `to` are left alone.
pub fn rename_attribute(html: &str, tag: &str, from: &str, to: &str) -> String {
    let dom = parse(html);
    let mut renamed = 0;

    for node in elements(&dom, tag) {
        let NodeData::Element { attrs, .. } = &node.data else {
            continue;
        };
        let mut attrs = attrs.borrow_mut();
        if attrs.iter().any(|attr| is_attribute(attr, to)) {
            continue;
        }
        if let Some(attr) = attrs.iter_mut().find(|attr| is_attribute(attr, from)) {
            attr.name.local = LocalName::from(to.to_ascii_lowercase());
            renamed += 1;
        }
    }

    if renamed == 0 {
        return html.to_string();
    }
    tracing::trace!("Renamed {} on {} <{}> element(s)", from, renamed, tag);
    render(&dom, html)
}

/// Remove every `tag` element for which `matches` holds, with its contents
pub fn remove_tags(html: &str, tag: &str, matches: impl Fn(&Tag) -> bool) -> String {
    let dom = parse(html);
    let mut removed = 0;

    for node in elements(&dom, tag) {
        if !Tag::from_node(&node).is_some_and(|found| matches(&found)) {
            continue;
        }
        if let Some(parent) = node.parent.take().and_then(|weak| weak.upgrade()) {
            parent.children.borrow_mut().retain(|child| !Rc::ptr_eq(child, &node));
            removed += 1;
        }
    }

    if removed == 0 {
        return html.to_string();
    }
    render(&dom, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_img_attributes() {
        let html = r#"<p>x</p><IMG src="../I/m/a.png" alt='A &amp; B' class=thumb width=20><img/>"#;
        let tags = scan(html, "img");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "img");
        assert_eq!(tags[0].attr("SRC"), Some("../I/m/a.png"));
        assert_eq!(tags[0].attr("alt"), Some("A & B"));
        assert_eq!(tags[0].attr("class"), Some("thumb"));
        assert_eq!(tags[0].attr("width"), Some("20"));
        assert_eq!(tags[1].attr("src"), None);
    }

    #[test]
    fn test_scan_skips_other_names() {
        let html = r#"<imgx src="a"><picture src="b"></picture><img src="c">"#;
        let tags = scan(html, "img");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].attr("src"), Some("c"));
    }

    #[test]
    fn test_legacy_image_tag_is_img() {
        let tags = scan(r#"<image src="b"><img src="c">"#, "img");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].attr("src"), Some("b"));
    }

    #[test]
    fn test_quoted_gt_inside_value() {
        let tags = scan(r#"<img alt="a > b" src="x.png"><p>"#, "img");
        assert_eq!(tags[0].attr("alt"), Some("a > b"));
        assert_eq!(tags[0].attr("src"), Some("x.png"));
    }

    #[test]
    fn test_valueless_attribute() {
        let tags = scan(r#"<link rel="stylesheet" disabled href="s.css">"#, "link");
        assert!(tags[0].has_attr("disabled"));
        assert_eq!(tags[0].attr("disabled"), Some(""));
        assert_eq!(tags[0].attr("href"), Some("s.css"));
    }

    #[test]
    fn test_rename_attribute() {
        let html = r#"<img src="a.png"><img data-x="1" SRC='b.png'><img data-archive-src="c" src="d">"#;
        let out = rename_attribute(html, "img", "src", "data-archive-src");
        assert!(out.contains(r#"<img data-archive-src="a.png">"#));
        assert!(out.contains(r#"<img data-x="1" data-archive-src="b.png">"#));
        assert!(out.contains(r#"<img data-archive-src="c" src="d">"#));
    }

    #[test]
    fn test_remove_tags() {
        let html = r#"<link rel="stylesheet" href="a.css"><link rel="icon" href="i.ico"><p>"#;
        let out = remove_tags(html, "link", |t| t.attr("rel") == Some("stylesheet"));
        assert!(!out.contains("a.css"));
        assert!(out.contains(r#"<link rel="icon" href="i.ico">"#));
        assert!(out.contains("<p></p>"));
    }
}
