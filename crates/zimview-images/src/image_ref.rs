//! Image placeholders and resource classes

/// Identity of one placeholder node within a rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderId(pub usize);

/// Resource class of an embedded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// Ordinary bitmap image
    Raster,
    /// Rendered formula/diagram with an alternate representation
    VectorFallback,
}

/// Class marker carried by math formula fallback images
pub const MATH_FALLBACK_MARKER: &str = "mwe-math-fallback";

/// Classify a placeholder from its reference, class attribute and alt text.
///
/// Rules, in order:
/// 1. a reference whose path ends in `.svg` is a vector fallback;
/// 2. a math fallback marker in the class list, together with non-empty alt
///    text, is a vector fallback;
/// 3. anything else is raster.
pub fn classify(source: &str, class_attr: &str, alt: Option<&str>) -> ResourceClass {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    if path.to_ascii_lowercase().ends_with(".svg") {
        return ResourceClass::VectorFallback;
    }

    if has_math_marker(class_attr) && alt.is_some_and(|a| !a.trim().is_empty()) {
        return ResourceClass::VectorFallback;
    }

    ResourceClass::Raster
}

fn has_math_marker(class_attr: &str) -> bool {
    class_attr
        .to_ascii_lowercase()
        .contains(MATH_FALLBACK_MARKER)
}

/// One embedded-image placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: PlaceholderId,
    /// Resource store key
    pub source_title: String,
    pub class: ResourceClass,
    /// Textual form of a math formula, when the placeholder is a math fallback
    pub math_text: Option<String>,
}

impl ImageRef {
    /// Build a placeholder from its decoded title and raw markup attributes
    pub fn new(id: PlaceholderId, source_title: &str, class_attr: &str, alt: Option<&str>) -> Self {
        let math_text = if has_math_marker(class_attr) {
            alt.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string)
        } else {
            None
        };

        Self {
            id,
            source_title: source_title.to_string(),
            class: classify(source_title, class_attr, alt),
            math_text,
        }
    }

    /// Plain raster placeholder
    pub fn raster(id: usize, source_title: &str) -> Self {
        Self::new(PlaceholderId(id), source_title, "", None)
    }

    pub fn is_vector_fallback(&self) -> bool {
        self.class == ResourceClass::VectorFallback
    }

    /// Formula text usable by the typeset fast path
    pub fn typesettable(&self) -> Option<&str> {
        self.math_text.as_deref()
    }
}
