//! zimview Archive Access
//!
//! Title-addressed access to an already opened offline archive.
//!
//! The archive itself is an external collaborator: anything implementing
//! [`ResourceStore`] can back a reader. [`fetch`] layers transparent,
//! depth-capped redirect resolution on top of the two store primitives.

mod entry;
pub mod markup;
mod memory;
pub mod mime;
mod store;
pub mod title;

pub use entry::{DirEntry, EntryKind, Resource};
pub use memory::MemoryArchive;
pub use store::{MAX_REDIRECT_DEPTH, ResourceStore, fetch};

/// Archive error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    #[error("Title not found in archive: {0}")]
    NotFound(String),

    #[error("Redirect chain starting at {title} exceeds {depth} hops")]
    RedirectCycle { title: String, depth: usize },

    #[error("Cannot read {title}: {reason}")]
    Read { title: String, reason: String },
}

impl ArchiveError {
    /// True for errors that mean "this title has no content", as opposed to a
    /// broken archive.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound(_))
    }
}
