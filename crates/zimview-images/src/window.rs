//! Visibility windows over the outstanding image list

use crate::ImageRef;

/// First and last visible positions in an ordered image list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityWindow {
    pub first: Option<usize>,
    pub last: Option<usize>,
}

impl VisibilityWindow {
    /// Nothing visible
    pub const NONE: VisibilityWindow = VisibilityWindow { first: None, last: None };

    pub fn new(first: usize, last: usize) -> Self {
        Self {
            first: Some(first),
            last: Some(last),
        }
    }

    /// Scan `images` in order for the first run of visible entries.
    ///
    /// The scan stops at the first invisible image after a visible one, so a
    /// second visible run further down is ignored.
    pub fn scan(images: &[ImageRef], mut is_visible: impl FnMut(&ImageRef) -> bool) -> Self {
        let mut window = Self::NONE;
        for (i, image) in images.iter().enumerate() {
            if is_visible(image) {
                window.first.get_or_insert(i);
                window.last = Some(i);
            } else if window.last.is_some() {
                break;
            }
        }
        if let (Some(first), Some(last)) = (window.first, window.last) {
            tracing::trace!("Visible images #{}..=#{}", first, last);
        }
        window
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    pub fn contains(&self, index: usize) -> bool {
        match (self.first, self.last) {
            (Some(first), Some(last)) => first <= index && index <= last,
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        match (self.first, self.last) {
            (Some(first), Some(last)) if last >= first => last - first + 1,
            _ => 0,
        }
    }
}
