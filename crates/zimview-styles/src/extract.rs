//! Stylesheet reference extraction

use zimview_archive::markup::{self, Tag};
use zimview_archive::title;

/// Where a stylesheet lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetOrigin {
    /// Inside the archive, under this title
    Archive { title: String },
    /// Outside the archive; left for the view to handle
    External,
}

/// One `<link rel="stylesheet">` of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetRef {
    /// The `href` as written
    pub href: String,
    pub origin: StylesheetOrigin,
}

impl StylesheetRef {
    pub fn title(&self) -> Option<&str> {
        match &self.origin {
            StylesheetOrigin::Archive { title } => Some(title),
            StylesheetOrigin::External => None,
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self.origin, StylesheetOrigin::Archive { .. })
    }
}

/// `rel` lists `stylesheet` and there is an `href`
pub fn is_stylesheet_link(tag: &Tag) -> bool {
    let is_stylesheet = tag
        .attr("rel")
        .is_some_and(|rel| rel.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")));
    is_stylesheet && tag.attr("href").is_some_and(|href| !href.trim().is_empty())
}

/// Stylesheet references of `html`, in document order
pub fn extract_stylesheets(article_title: &str, html: &str) -> Vec<StylesheetRef> {
    markup::scan(html, "link")
        .iter()
        .filter(|tag| is_stylesheet_link(tag))
        .filter_map(|tag| {
            let href = tag.attr("href")?.to_string();
            let origin = match title::resolve_reference(article_title, &href) {
                Some(title) => StylesheetOrigin::Archive { title },
                None => StylesheetOrigin::External,
            };
            Some(StylesheetRef { href, origin })
        })
        .collect()
}

/// Remove every stylesheet `<link>` from `html`
pub fn strip_stylesheet_links(html: &str) -> String {
    markup::remove_tags(html, "link", is_stylesheet_link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_in_order() {
        let html = r#"<head>
            <link rel="stylesheet" href="../-/s/style.css?v=3">
            <link rel="icon" href="../-/favicon">
            <link href="https://fonts.example.com/f.css" rel="Stylesheet">
            <link rel="alternate stylesheet" href="/-/s/print%20view.css">
        </head>"#;

        let sheets = extract_stylesheets("A/Sine", html);
        assert_eq!(sheets.len(), 3);
        assert_eq!(sheets[0].title(), Some("-/s/style.css"));
        assert_eq!(sheets[0].href, "../-/s/style.css?v=3");
        assert_eq!(sheets[1].origin, StylesheetOrigin::External);
        assert_eq!(sheets[2].title(), Some("-/s/print view.css"));
    }

    #[test]
    fn test_link_without_href_ignored() {
        let sheets = extract_stylesheets("A/x", r#"<link rel="stylesheet"><link rel="stylesheet" href="">"#);
        assert!(sheets.is_empty());
    }

    #[test]
    fn test_strip_links() {
        let html = r#"<head><link rel="stylesheet" href="a.css"><link rel="icon" href="i"></head>"#;
        assert_eq!(
            strip_stylesheet_links(html),
            r#"<html><head><link rel="icon" href="i"></head><body></body></html>"#
        );
    }

    #[test]
    fn test_commented_link_ignored() {
        let html = r#"<head><!-- <link rel="stylesheet" href="old.css"> --><link rel="stylesheet" href="new.css"></head>"#;
        let sheets = extract_stylesheets("A/x", html);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].href, "new.css");
    }
}
