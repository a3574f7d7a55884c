//! Shared fakes for the scheduler tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use zimview_archive::{ArchiveError, DirEntry, MemoryArchive, Resource, ResourceStore};
use zimview_images::{ImageRef, PageView, PlaceholderId, ViewAdapter, Viewport};

pub const IMAGE_HEIGHT: f32 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The store was asked for a title
    Fetch(String),
    /// The view received content for a placeholder
    Apply(PlaceholderId),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn fetches(log: &Log) -> Vec<String> {
    log.borrow()
        .iter()
        .filter_map(|event| match event {
            Event::Fetch(title) => Some(title.clone()),
            Event::Apply(_) => None,
        })
        .collect()
}

pub fn fetch_count(log: &Log, title: &str) -> usize {
    fetches(log).iter().filter(|t| t.as_str() == title).count()
}

pub fn png(i: usize) -> String {
    format!("I/m/{}.png", i)
}

pub fn svg(i: usize) -> String {
    format!("I/m/{}.svg", i)
}

/// Archive holding every title in `titles`
pub fn archive(titles: &[String]) -> MemoryArchive {
    let mut archive = MemoryArchive::new();
    for (i, title) in titles.iter().enumerate() {
        let mime = if title.ends_with(".svg") { "image/svg+xml" } else { "image/png" };
        archive.insert(title, mime, vec![i as u8; 4]);
    }
    archive
}

/// Store that logs lookups and tracks how many fetches overlap
pub struct RecordingStore {
    inner: MemoryArchive,
    log: Log,
    active: Cell<usize>,
    max_active: Cell<usize>,
}

impl RecordingStore {
    pub fn new(inner: MemoryArchive, log: Log) -> Self {
        Self {
            inner,
            log,
            active: Cell::new(0),
            max_active: Cell::new(0),
        }
    }

    pub fn max_active(&self) -> usize {
        self.max_active.get()
    }
}

impl ResourceStore for RecordingStore {
    async fn resolve_title(&self, title: &str) -> Result<Option<DirEntry>, ArchiveError> {
        self.log.borrow_mut().push(Event::Fetch(title.to_string()));
        let found = self.inner.resolve_title(title).await?;
        if found.is_some() {
            self.active.set(self.active.get() + 1);
            self.max_active.set(self.max_active.get().max(self.active.get()));
        }
        Ok(found)
    }

    async fn read(&self, entry: &DirEntry) -> Result<Resource, ArchiveError> {
        let resource = self.inner.read(entry).await;
        self.active.set(self.active.get().saturating_sub(1));
        resource
    }
}

/// Page view whose scroll position can be moved from outside, or after a
/// number of applied images
pub struct ScriptedView {
    pub page: PageView,
    scroll: Rc<Cell<f32>>,
    log: Log,
    scroll_after: Option<(usize, f32)>,
    applied: usize,
}

impl ScriptedView {
    /// `images` stacked `IMAGE_HEIGHT` apart, viewport of `height` at `scroll`
    pub fn new(images: Vec<ImageRef>, scroll: f32, height: f32, log: Log) -> Self {
        let page = PageView::stacked(images, IMAGE_HEIGHT, Viewport::new(0.0, 0.0, 800.0, height));
        Self {
            page,
            scroll: Rc::new(Cell::new(scroll)),
            log,
            scroll_after: None,
            applied: 0,
        }
    }

    /// Jump to `y` once `count` images have been applied
    pub fn scroll_after(mut self, count: usize, y: f32) -> Self {
        self.scroll_after = Some((count, y));
        self
    }

    pub fn with_typesetting(mut self) -> Self {
        self.page = self.page.with_typesetting();
        self
    }

    /// Handle for moving the viewport while the session owns the view
    pub fn scroll_handle(&self) -> Rc<Cell<f32>> {
        Rc::clone(&self.scroll)
    }
}

impl ViewAdapter for ScriptedView {
    fn list_placeholders(&self) -> Vec<ImageRef> {
        self.page.list_placeholders()
    }

    fn is_visible(&self, id: PlaceholderId) -> bool {
        let mut viewport = self.page.viewport();
        viewport.y = self.scroll.get();
        self.page.rect(id).is_some_and(|rect| viewport.intersects(&rect))
    }

    fn apply_content(&mut self, id: PlaceholderId, content: &[u8], mime_type: &str) {
        self.log.borrow_mut().push(Event::Apply(id));
        self.page.apply_content(id, content, mime_type);
        self.applied += 1;
        if let Some((count, y)) = self.scroll_after {
            if self.applied == count {
                self.scroll.set(y);
            }
        }
    }

    fn typeset(&mut self, id: PlaceholderId, tex: &str) -> bool {
        self.page.typeset(id, tex)
    }
}

pub fn rasters(n: usize) -> Vec<ImageRef> {
    (0..n).map(|i| ImageRef::raster(i, &png(i))).collect()
}

pub fn vectors(n: usize) -> Vec<ImageRef> {
    (0..n).map(|i| ImageRef::new(PlaceholderId(i), &svg(i), "", None)).collect()
}

pub fn titles(images: &[ImageRef]) -> Vec<String> {
    images.iter().map(|image| image.source_title.clone()).collect()
}
