//! Opened articles

use zimview_archive::{markup, title};
use zimview_images::{DEFERRED_SRC_ATTR, MATH_FALLBACK_MARKER};
use zimview_styles::ResolvedStylesheet;

/// An article ready for first paint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// Markup with stylesheets inlined and image loads deferred
    pub html: String,
    /// Stylesheets in document order
    pub stylesheets: Vec<ResolvedStylesheet>,
    /// Contains math formula fallback images
    pub has_math: bool,
    /// Number of `<img>` tags that reference an archive resource
    pub image_count: usize,
}

/// Move every `<img src>` to the deferred attribute so nothing loads
/// before the scheduler asks for it
pub fn defer_images(html: &str) -> String {
    markup::rename_attribute(html, "img", "src", DEFERRED_SRC_ATTR)
}

/// Number of `<img>` tags whose reference resolves to an archive title.
///
/// Matches the placeholders a view built from the same markup holds.
pub fn count_archive_images(article_title: &str, html: &str) -> usize {
    markup::scan(html, "img")
        .iter()
        .filter_map(|tag| tag.attr(DEFERRED_SRC_ATTR).or_else(|| tag.attr("src")))
        .filter(|reference| title::resolve_reference(article_title, reference).is_some())
        .count()
}

/// Any `<img>` marked as a math fallback that carries alt text
pub fn has_math_fallbacks(html: &str) -> bool {
    markup::scan(html, "img").iter().any(|tag| {
        let marked = tag
            .attr("class")
            .is_some_and(|class| class.to_ascii_lowercase().contains(MATH_FALLBACK_MARKER));
        marked && tag.attr("alt").is_some_and(|alt| !alt.trim().is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defer_images() {
        let html = r#"<p><img src="../I/m/a.png" alt="a"><IMG SRC=../I/m/b.png></p><script src="x.js"></script>"#;
        let out = defer_images(html);
        assert!(out.contains(r#"<img data-archive-src="../I/m/a.png" alt="a">"#));
        assert!(out.contains(r#"<img data-archive-src="../I/m/b.png">"#));
        assert!(out.contains(r#"<script src="x.js"></script>"#));
        assert!(!out.contains("<img src"));
    }

    #[test]
    fn test_count_archive_images() {
        let html = r#"<img data-archive-src="../I/m/a.png"><img src="https://example.com/b.png"><img><img src="../I/m/c.png">"#;
        assert_eq!(count_archive_images("A/Sine", html), 2);
    }

    #[test]
    fn test_has_math() {
        assert!(has_math_fallbacks(
            r#"<img class="mwe-math-fallback-image-inline" alt="\sin x" src="f.svg">"#
        ));
        assert!(!has_math_fallbacks(r#"<img class="mwe-math-fallback-image-inline" alt="" src="f.svg">"#));
        assert!(!has_math_fallbacks(r#"<img alt="photo" src="p.jpg">"#));
    }
}
