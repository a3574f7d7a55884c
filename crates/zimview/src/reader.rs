//! Reader
//!
//! Opens articles from a store and hands out the per-article image session
//! or the relay resolver, depending on the delivery mode.

use zimview_archive::{ResourceStore, fetch};
use zimview_images::{ImageSession, ViewAdapter};
use zimview_relay::RelayResolver;
use zimview_styles::{extract_stylesheets, inline_stylesheets, resolve_stylesheets};

use crate::article::{count_archive_images, defer_images, has_math_fallbacks};
use crate::{Article, DeliveryMode, ReaderConfig, ReaderError};

/// Archive reader
pub struct Reader<S> {
    store: S,
    config: ReaderConfig,
}

impl<S: ResourceStore> Reader<S> {
    pub fn new(store: S, config: ReaderConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Load an article and prepare it for first paint.
    ///
    /// Redirects are followed; image loads are deferred and every stylesheet
    /// is resolved and inlined before this returns.
    pub async fn open_article(&self, title: &str) -> Result<Article, ReaderError> {
        tracing::info!("Opening {}", title);
        let resource = fetch(&self.store, title).await?;
        if !resource.mime_type.starts_with("text/html") {
            return Err(ReaderError::NotAnArticle {
                title: title.to_string(),
                mime_type: resource.mime_type,
            });
        }

        let html = defer_images(&resource.text());
        let image_count = count_archive_images(title, &html);
        let has_math = has_math_fallbacks(&html);

        tracing::info!("Loading stylesheets...");
        let refs = extract_stylesheets(title, &html);
        let stylesheets = resolve_stylesheets(&self.store, &refs).await;
        let html = inline_stylesheets(&html, &stylesheets);

        tracing::debug!(
            "{}: {} image(s), {} stylesheet(s), math: {}",
            title,
            image_count,
            stylesheets.len(),
            has_math
        );
        Ok(Article {
            title: title.to_string(),
            html,
            stylesheets,
            has_math,
            image_count,
        })
    }

    /// Image scheduler for a rendered article (direct injection only)
    pub fn image_session<V: ViewAdapter>(&self, view: V) -> Result<ImageSession<&S, V>, ReaderError> {
        if self.config.delivery != DeliveryMode::DirectInjection {
            return Err(ReaderError::Config(
                "image session requires direct injection delivery".to_string(),
            ));
        }
        ImageSession::new(&self.store, view, self.config.images.clone())
            .map_err(|err| ReaderError::Config(err.to_string()))
    }

    /// Content resolver for a relayed view (relay delivery only)
    pub fn relay(&self) -> Option<RelayResolver<&S>> {
        match self.config.delivery {
            DeliveryMode::Relay => Some(RelayResolver::new(&self.store)),
            DeliveryMode::DirectInjection => None,
        }
    }
}
