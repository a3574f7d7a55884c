//! zimview Image Scheduler
//!
//! Viewport-prioritized loading of the images embedded in a rendered
//! article. Outstanding images are sorted into three queues per round:
//!
//! - **Visible**: on screen, fetched first in capped batches
//! - **Prefetch**: the stretch just below the viewport, fetched next
//! - **VectorFallback**: math/vector fallbacks, fetched last in small rounds
//!   that are dropped as soon as the viewport moves
//!
//! Scrolling re-runs classification once the viewport settles.

mod classifier;
mod config;
mod image_ref;
mod monitor;
pub mod runner;
mod session;
mod view;
mod window;

pub use classifier::{Classification, SliceKind, SliceQueues, prepare, triage};
pub use config::ImageConfig;
pub use image_ref::{ImageRef, MATH_FALLBACK_MARKER, PlaceholderId, ResourceClass, classify};
pub use monitor::{Debounce, ScrollEvent, ScrollHandle, ScrollMonitor};
pub use runner::{RunnerState, SliceRunner, Step};
pub use session::{ImageSession, SessionStatus};
pub use view::{DEFAULT_PLACEHOLDER_HEIGHT, DEFERRED_SRC_ATTR, NodeContent, PageView, Rect, ViewAdapter, Viewport};
pub use window::VisibilityWindow;

use zimview_archive::ArchiveError;

/// Image scheduler error
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Invalid image configuration: {0}")]
    InvalidConfig(String),

    #[error("No image placeholder {0:?}")]
    UnknownPlaceholder(PlaceholderId),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}
