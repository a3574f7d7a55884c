//! Directory entries and resources

/// What a directory entry points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Binary content with a stored mime type (may be empty)
    Content { mime_type: String },
    /// Alias for another title
    Redirect { target: String },
}

/// A directory entry returned by title lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub title: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn content(title: &str, mime_type: &str) -> Self {
        Self {
            title: title.to_string(),
            kind: EntryKind::Content {
                mime_type: mime_type.to_string(),
            },
        }
    }

    pub fn redirect(title: &str, target: &str) -> Self {
        Self {
            title: title.to_string(),
            kind: EntryKind::Redirect {
                target: target.to_string(),
            },
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.kind, EntryKind::Redirect { .. })
    }

    /// Redirect target, if this entry is a redirect
    pub fn redirect_target(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Redirect { target } => Some(target),
            EntryKind::Content { .. } => None,
        }
    }
}

/// Resolved binary resource
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resource {
    pub content: Vec<u8>,
    pub mime_type: String,
}

impl Resource {
    pub fn new(content: Vec<u8>, mime_type: &str) -> Self {
        Self {
            content,
            mime_type: mime_type.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Get body as text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}
