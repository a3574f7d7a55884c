//! In-memory archive
//!
//! A `ResourceStore` over a title map. Loadable from a directory tree where
//! each file's relative path is its title; a file named `<title>.redirect`
//! holding another title declares a redirect entry.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::mime;
use crate::{ArchiveError, DirEntry, EntryKind, Resource, ResourceStore};

const REDIRECT_SUFFIX: &str = ".redirect";

#[derive(Debug, Clone)]
struct Stored {
    entry: DirEntry,
    content: Vec<u8>,
}

/// Archive held entirely in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryArchive {
    entries: HashMap<String, Stored>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file under `root`
    pub fn from_dir(root: &Path) -> io::Result<Self> {
        let mut archive = Self::new();
        archive.load_dir(root, root)?;
        tracing::info!("Loaded {} archive entries from {}", archive.len(), root.display());
        Ok(archive)
    }

    fn load_dir(&mut self, root: &Path, dir: &Path) -> io::Result<()> {
        for dirent in fs::read_dir(dir)? {
            let dirent = dirent?;
            let path = dirent.path();
            // Symlinks are not followed, so a link cycle cannot recurse forever
            let file_type = dirent.file_type()?;
            if file_type.is_dir() {
                self.load_dir(root, &path)?;
                continue;
            }
            if file_type.is_symlink() {
                tracing::debug!("Skipping symlink {}", path.display());
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let title = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let content = fs::read(&path)?;

            match title.strip_suffix(REDIRECT_SUFFIX) {
                Some(source) => {
                    let target = String::from_utf8_lossy(&content).trim().to_string();
                    self.insert_redirect(source, &target);
                }
                None => {
                    let mime_type = mime::guess(&title);
                    self.insert(&title, &mime_type, content);
                }
            }
        }
        Ok(())
    }

    /// Add a content entry (replaces any existing entry)
    pub fn insert(&mut self, title: &str, mime_type: &str, content: Vec<u8>) {
        self.entries.insert(
            title.to_string(),
            Stored {
                entry: DirEntry::content(title, mime_type),
                content,
            },
        );
    }

    /// Add a redirect entry
    pub fn insert_redirect(&mut self, title: &str, target: &str) {
        self.entries.insert(
            title.to_string(),
            Stored {
                entry: DirEntry::redirect(title, target),
                content: Vec::new(),
            },
        );
    }

    pub fn contains(&self, title: &str) -> bool {
        self.entries.contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All titles, sorted
    pub fn titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        titles.sort_unstable();
        titles
    }
}

impl ResourceStore for MemoryArchive {
    async fn resolve_title(&self, title: &str) -> Result<Option<DirEntry>, ArchiveError> {
        smol::future::yield_now().await;
        Ok(self.entries.get(title).map(|stored| stored.entry.clone()))
    }

    async fn read(&self, entry: &DirEntry) -> Result<Resource, ArchiveError> {
        smol::future::yield_now().await;

        let EntryKind::Content { mime_type } = &entry.kind else {
            return Err(ArchiveError::Read {
                title: entry.title.clone(),
                reason: "entry is a redirect".to_string(),
            });
        };

        let stored = self
            .entries
            .get(&entry.title)
            .ok_or_else(|| ArchiveError::NotFound(entry.title.clone()))?;
        Ok(Resource::new(stored.content.clone(), mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_title() {
        let mut archive = MemoryArchive::new();
        archive.insert("I/m/a.png", "image/png", vec![1, 2, 3]);

        let entry = smol::block_on(archive.resolve_title("I/m/a.png")).unwrap();
        assert_eq!(entry, Some(DirEntry::content("I/m/a.png", "image/png")));

        let missing = smol::block_on(archive.resolve_title("I/m/b.png")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_read_redirect_is_error() {
        let mut archive = MemoryArchive::new();
        archive.insert_redirect("A/Old", "A/New");
        let entry = DirEntry::redirect("A/Old", "A/New");
        let err = smol::block_on(archive.read(&entry)).unwrap_err();
        assert!(matches!(err, ArchiveError::Read { .. }));
    }

    #[test]
    fn test_titles_sorted() {
        let mut archive = MemoryArchive::new();
        archive.insert("I/b.png", "image/png", vec![]);
        archive.insert("A/a", "text/html", vec![]);
        archive.insert_redirect("A/c", "A/a");
        assert_eq!(archive.titles(), vec!["A/a", "A/c", "I/b.png"]);
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn test_from_dir() {
        let root = std::env::temp_dir().join(format!("zimview-archive-{}", std::process::id()));
        let images = root.join("I").join("m");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(root.join("A")).unwrap();
        fs::write(images.join("dot.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(root.join("A").join("Sine"), "<p>x</p>").unwrap();
        fs::write(root.join("A").join("Sinus.redirect"), "A/Sine\n").unwrap();

        let archive = MemoryArchive::from_dir(&root).unwrap();
        fs::remove_dir_all(&root).unwrap();

        assert!(archive.contains("I/m/dot.png"));
        let entry = smol::block_on(archive.resolve_title("A/Sinus")).unwrap().unwrap();
        assert_eq!(entry.redirect_target(), Some("A/Sine"));
        let png = smol::block_on(archive.resolve_title("I/m/dot.png")).unwrap().unwrap();
        assert_eq!(png, DirEntry::content("I/m/dot.png", "image/png"));
        let article = smol::block_on(archive.resolve_title("A/Sine")).unwrap().unwrap();
        assert_eq!(article, DirEntry::content("A/Sine", "text/html"));
    }

    #[cfg(unix)]
    #[test]
    fn test_from_dir_symlink_loop() {
        let root = std::env::temp_dir().join(format!("zimview-archive-loop-{}", std::process::id()));
        fs::create_dir_all(root.join("A")).unwrap();
        fs::write(root.join("A").join("Sine"), "<p>x</p>").unwrap();
        std::os::unix::fs::symlink(&root, root.join("A").join("loop")).unwrap();

        let archive = MemoryArchive::from_dir(&root);
        fs::remove_dir_all(&root).unwrap();

        let archive = archive.unwrap();
        assert_eq!(archive.titles(), vec!["A/Sine"]);
    }
}
