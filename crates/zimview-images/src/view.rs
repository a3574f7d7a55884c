//! View Adapter
//!
//! The scheduler's window onto the rendered document, plus [`PageView`], a
//! geometric implementation built from article HTML.

use zimview_archive::markup;
use zimview_archive::title;

use crate::{ImageRef, PlaceholderId};

/// Attribute holding a deferred image reference
pub const DEFERRED_SRC_ATTR: &str = "data-archive-src";

/// Height given to placeholders that declare none
pub const DEFAULT_PLACEHOLDER_HEIGHT: f32 = 150.0;

/// Access to the placeholders of a rendered document
pub trait ViewAdapter {
    /// Every image placeholder, in document order
    fn list_placeholders(&self) -> Vec<ImageRef>;

    /// Is the placeholder geometrically within the viewport
    fn is_visible(&self, id: PlaceholderId) -> bool;

    /// Fill a placeholder with fetched bytes.
    ///
    /// Must tolerate being called again for an already filled placeholder.
    fn apply_content(&mut self, id: PlaceholderId, content: &[u8], mime_type: &str);

    /// Classification predicate for vector/math fallbacks
    fn mark_vector_fallback(&self, image: &ImageRef) -> bool {
        image.is_vector_fallback()
    }

    /// Replace a math fallback with typeset formula text. Returns false when
    /// the view cannot typeset, in which case the image is fetched instead.
    fn typeset(&mut self, _id: PlaceholderId, _tex: &str) -> bool {
        false
    }
}

/// Rectangle in document coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Visible part of the document
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if a rectangle intersects the viewport
    pub fn intersects(&self, rect: &Rect) -> bool {
        rect.x < self.right()
            && rect.x + rect.width > self.x
            && rect.y < self.bottom()
            && rect.y + rect.height > self.y
    }
}

/// What a placeholder currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    Placeholder,
    Image { mime_type: String, content: Vec<u8> },
    Typeset { tex: String },
}

#[derive(Debug, Clone)]
struct PlaceholderNode {
    image: ImageRef,
    rect: Rect,
    content: NodeContent,
    applications: usize,
}

/// Document view with stacked placeholder geometry
#[derive(Debug, Clone)]
pub struct PageView {
    nodes: Vec<PlaceholderNode>,
    viewport: Viewport,
    can_typeset: bool,
}

impl PageView {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            nodes: Vec::new(),
            viewport,
            can_typeset: false,
        }
    }

    /// Images of equal height stacked top to bottom
    pub fn stacked(images: Vec<ImageRef>, height: f32, viewport: Viewport) -> Self {
        let mut view = Self::new(viewport);
        for (i, image) in images.into_iter().enumerate() {
            let rect = Rect::new(0.0, i as f32 * height, viewport.width, height);
            view.push(image, rect);
        }
        view
    }

    /// Build placeholders from the `<img>` tags of an article.
    ///
    /// Deferred (`data-archive-src`) references win over `src`. Tags whose
    /// reference does not resolve into the archive get no placeholder.
    pub fn from_html(article_title: &str, html: &str, viewport: Viewport) -> Self {
        let mut view = Self::new(viewport);
        let mut y = 0.0;

        for tag in markup::scan(html, "img") {
            let height = tag
                .attr("height")
                .and_then(|h| h.trim_end_matches("px").parse::<f32>().ok())
                .unwrap_or(DEFAULT_PLACEHOLDER_HEIGHT);
            let width = tag
                .attr("width")
                .and_then(|w| w.trim_end_matches("px").parse::<f32>().ok())
                .unwrap_or(viewport.width);
            let rect = Rect::new(0.0, y, width, height);
            y += height;

            let Some(reference) = tag.attr(DEFERRED_SRC_ATTR).or_else(|| tag.attr("src")) else {
                continue;
            };
            let Some(source_title) = title::resolve_reference(article_title, reference) else {
                tracing::trace!("Skipping image outside the archive: {}", reference);
                continue;
            };

            let id = PlaceholderId(view.nodes.len());
            let image = ImageRef::new(id, &source_title, tag.attr("class").unwrap_or(""), tag.attr("alt"));
            view.push(image, rect);
        }

        tracing::debug!("Found {} image placeholder(s) in {}", view.nodes.len(), article_title);
        view
    }

    /// Enable the typeset hook
    pub fn with_typesetting(mut self) -> Self {
        self.can_typeset = true;
        self
    }

    pub fn push(&mut self, image: ImageRef, rect: Rect) {
        self.nodes.push(PlaceholderNode {
            image,
            rect,
            content: NodeContent::Placeholder,
            applications: 0,
        });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scroll_to(&mut self, y: f32) {
        self.viewport.y = y.max(0.0);
    }

    pub fn scroll_by(&mut self, dy: f32) {
        self.scroll_to(self.viewport.y + dy);
    }

    /// Total document height covered by placeholders
    pub fn content_height(&self) -> f32 {
        self.nodes
            .iter()
            .map(|node| node.rect.y + node.rect.height)
            .fold(0.0, f32::max)
    }

    pub fn rect(&self, id: PlaceholderId) -> Option<Rect> {
        self.node(id).map(|node| node.rect)
    }

    pub fn content(&self, id: PlaceholderId) -> Option<&NodeContent> {
        self.node(id).map(|node| &node.content)
    }

    /// How many times content was applied to a placeholder
    pub fn applications(&self, id: PlaceholderId) -> usize {
        self.node(id).map_or(0, |node| node.applications)
    }

    /// Placeholders no longer showing a placeholder
    pub fn filled_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.content != NodeContent::Placeholder)
            .count()
    }

    fn node(&self, id: PlaceholderId) -> Option<&PlaceholderNode> {
        self.nodes.iter().find(|node| node.image.id == id)
    }

    fn node_mut(&mut self, id: PlaceholderId) -> Option<&mut PlaceholderNode> {
        self.nodes.iter_mut().find(|node| node.image.id == id)
    }
}

impl ViewAdapter for PageView {
    fn list_placeholders(&self) -> Vec<ImageRef> {
        self.nodes.iter().map(|node| node.image.clone()).collect()
    }

    fn is_visible(&self, id: PlaceholderId) -> bool {
        self.node(id).is_some_and(|node| self.viewport.intersects(&node.rect))
    }

    fn apply_content(&mut self, id: PlaceholderId, content: &[u8], mime_type: &str) {
        let Some(node) = self.node_mut(id) else {
            tracing::warn!("No placeholder {:?} to fill", id);
            return;
        };
        node.applications += 1;
        if let NodeContent::Image { content: current, .. } = &node.content {
            if current == content {
                return;
            }
        }
        node.content = NodeContent::Image {
            mime_type: mime_type.to_string(),
            content: content.to_vec(),
        };
    }

    fn typeset(&mut self, id: PlaceholderId, tex: &str) -> bool {
        if !self.can_typeset {
            return false;
        }
        match self.node_mut(id) {
            Some(node) => {
                node.content = NodeContent::Typeset { tex: tex.to_string() };
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacked(n: usize) -> PageView {
        let images = (0..n).map(|i| ImageRef::raster(i, &format!("I/m/{}.png", i))).collect();
        PageView::stacked(images, 100.0, Viewport::new(0.0, 1000.0, 800.0, 800.0))
    }

    #[test]
    fn test_viewport_intersects_edges() {
        let vp = Viewport::new(0.0, 100.0, 800.0, 600.0);
        assert!(vp.intersects(&Rect::new(0.0, 150.0, 10.0, 10.0)));
        assert!(!vp.intersects(&Rect::new(0.0, 0.0, 10.0, 100.0)));
        assert!(!vp.intersects(&Rect::new(0.0, 700.0, 10.0, 10.0)));
    }

    #[test]
    fn test_stacked_visibility() {
        let view = stacked(50);
        let visible: Vec<usize> = (0..50).filter(|i| view.is_visible(PlaceholderId(*i))).collect();
        assert_eq!(visible, (10..=17).collect::<Vec<_>>());
    }

    #[test]
    fn test_scroll_changes_visibility() {
        let mut view = stacked(50);
        view.scroll_to(0.0);
        assert!(view.is_visible(PlaceholderId(0)));
        view.scroll_by(-50.0);
        assert_eq!(view.viewport().y, 0.0);
        view.scroll_by(4000.0);
        assert!(view.is_visible(PlaceholderId(45)));
        assert_eq!(view.content_height(), 5000.0);
    }

    #[test]
    fn test_apply_content_idempotent() {
        let mut view = stacked(2);
        view.apply_content(PlaceholderId(1), &[1, 2, 3], "image/png");
        view.apply_content(PlaceholderId(1), &[1, 2, 3], "image/png");
        assert_eq!(view.applications(PlaceholderId(1)), 2);
        assert_eq!(view.filled_count(), 1);
        assert_eq!(
            view.content(PlaceholderId(1)),
            Some(&NodeContent::Image { mime_type: "image/png".to_string(), content: vec![1, 2, 3] })
        );
    }

    #[test]
    fn test_from_html() {
        let html = r#"
            <img data-archive-src="../I/m/a.png" height="40">
            <img src="https://example.com/ext.png">
            <img src="../I/m/f.svg" class="mwe-math-fallback-image-inline" alt="x^2">
        "#;
        let view = PageView::from_html("A/Sine", html, Viewport::new(0.0, 0.0, 800.0, 600.0));
        let images = view.list_placeholders();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].source_title, "I/m/a.png");
        assert_eq!(images[1].source_title, "I/m/f.svg");
        assert!(images[1].is_vector_fallback());
        assert_eq!(images[1].typesettable(), Some("x^2"));
        assert_eq!(images[1].id, PlaceholderId(1));
    }

    #[test]
    fn test_typeset_requires_support() {
        let mut view = stacked(1);
        assert!(!view.typeset(PlaceholderId(0), "x"));
        let mut view = view.with_typesetting();
        assert!(view.typeset(PlaceholderId(0), "x"));
        assert_eq!(view.content(PlaceholderId(0)), Some(&NodeContent::Typeset { tex: "x".to_string() }));
    }
}
