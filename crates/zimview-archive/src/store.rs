//! Resource Store
//!
//! The two archive primitives and redirect-following fetch on top of them.

use std::rc::Rc;

use crate::mime;
use crate::{ArchiveError, DirEntry, Resource};

/// Maximum redirect hops followed before giving up
pub const MAX_REDIRECT_DEPTH: usize = 16;

/// Title-addressed archive access.
///
/// Both calls are suspension points; implementations must not block.
#[allow(async_fn_in_trait)]
pub trait ResourceStore {
    /// Look up a title. `Ok(None)` means the archive has no such entry.
    async fn resolve_title(&self, title: &str) -> Result<Option<DirEntry>, ArchiveError>;

    /// Read the content behind a (non-redirect) entry
    async fn read(&self, entry: &DirEntry) -> Result<Resource, ArchiveError>;
}

impl<T: ResourceStore + ?Sized> ResourceStore for &T {
    async fn resolve_title(&self, title: &str) -> Result<Option<DirEntry>, ArchiveError> {
        (**self).resolve_title(title).await
    }

    async fn read(&self, entry: &DirEntry) -> Result<Resource, ArchiveError> {
        (**self).read(entry).await
    }
}

impl<T: ResourceStore + ?Sized> ResourceStore for Rc<T> {
    async fn resolve_title(&self, title: &str) -> Result<Option<DirEntry>, ArchiveError> {
        (**self).resolve_title(title).await
    }

    async fn read(&self, entry: &DirEntry) -> Result<Resource, ArchiveError> {
        (**self).read(entry).await
    }
}

/// Resolve a title through any redirects and read its content.
///
/// A resource with no usable stored mime type gets one inferred from the
/// final entry's title.
pub async fn fetch<S: ResourceStore + ?Sized>(
    store: &S,
    title: &str,
) -> Result<Resource, ArchiveError> {
    let mut entry = lookup(store, title).await?;
    let mut depth = 0;

    while let Some(target) = entry.redirect_target().map(str::to_string) {
        depth += 1;
        if depth > MAX_REDIRECT_DEPTH {
            return Err(ArchiveError::RedirectCycle {
                title: title.to_string(),
                depth: MAX_REDIRECT_DEPTH,
            });
        }
        tracing::trace!("Following redirect {} -> {}", entry.title, target);
        entry = lookup(store, &target).await?;
    }

    let mut resource = store.read(&entry).await?;
    if !mime::is_specific(&resource.mime_type) {
        resource.mime_type = mime::guess(&entry.title);
    }
    Ok(resource)
}

async fn lookup<S: ResourceStore + ?Sized>(store: &S, title: &str) -> Result<DirEntry, ArchiveError> {
    store
        .resolve_title(title)
        .await?
        .ok_or_else(|| ArchiveError::NotFound(title.to_string()))
}
