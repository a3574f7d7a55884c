//! zimview
//!
//! Reader for offline content archives: opens an article, inlines its
//! stylesheets before first paint and loads its images viewport-first.
//!
//! # Example
//! ```rust,ignore
//! use zimview::{Reader, ReaderConfig};
//! use zimview::images::{PageView, Viewport};
//!
//! let reader = Reader::new(archive, ReaderConfig::default());
//! let article = reader.open_article("A/Sine").await?;
//! let view = PageView::from_html(&article.title, &article.html, Viewport::new(0.0, 0.0, 800.0, 600.0));
//! let mut session = reader.image_session(view)?;
//! session.start().await;
//! ```

mod article;
mod config;
mod reader;

pub use article::{Article, defer_images, has_math_fallbacks};
pub use config::{DeliveryMode, ReaderConfig};
pub use reader::Reader;

// Re-export sub-crates for advanced usage
pub use zimview_archive as archive;
pub use zimview_images as images;
pub use zimview_relay as relay;
pub use zimview_styles as styles;

/// Reader version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reader error
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("Archive error: {0}")]
    Archive(#[from] zimview_archive::ArchiveError),

    #[error("{title} is not an article ({mime_type})")]
    NotAnArticle { title: String, mime_type: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
