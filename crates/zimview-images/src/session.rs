//! Image Session
//!
//! Per-document driver joining the [`SliceRunner`] to a resource store and a
//! view. Fetches of one batch run concurrently on a local executor; their
//! completions come back over a channel and are fed to the runner one at a
//! time, so every counter stays on a single logical thread.

use smol::LocalExecutor;
use zimview_archive::{ArchiveError, Resource, ResourceStore, fetch};

use crate::classifier::{Classification, prepare};
use crate::runner::{CompletionEffect, Outcome, RoundToken, RunnerState, RunnerStats, SliceRunner, Step};
use crate::{ImageConfig, ImageError, ImageRef, PlaceholderId, ResourceClass, ScrollMonitor, ViewAdapter, VisibilityWindow};

/// Where a session stands after an entry point returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Automatic display is off; images load only on request
    Manual,
    /// A round is still in progress; the call did nothing
    Busy,
    /// Images remain; waiting for the viewport to move
    Idle,
    /// Every image has been handled
    Done,
}

/// One fetch result travelling back to the driver
struct Completion {
    token: RoundToken,
    id: PlaceholderId,
    title: String,
    result: Result<Resource, ArchiveError>,
}

/// Image loading state for one rendered document.
///
/// Created after render and dropped with the view. The futures returned by
/// [`start`](Self::start) and [`on_scroll_settled`](Self::on_scroll_settled)
/// must be driven to completion; dropping one mid-round leaves the session
/// busy.
pub struct ImageSession<S, V> {
    store: S,
    view: V,
    config: ImageConfig,
    runner: SliceRunner,
}

impl<S: ResourceStore, V: ViewAdapter> ImageSession<S, V> {
    pub fn new(store: S, view: V, config: ImageConfig) -> Result<Self, ImageError> {
        config.validate()?;
        let total = view.list_placeholders().len();
        tracing::debug!("Image session over {} placeholder(s)", total);
        Ok(Self {
            store,
            view,
            runner: SliceRunner::new(total, config.clone()),
            config,
        })
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn total(&self) -> usize {
        self.runner.total()
    }

    pub fn loaded_count(&self) -> usize {
        self.runner.loaded_count()
    }

    pub fn is_loaded(&self, id: PlaceholderId) -> bool {
        self.runner.is_loaded(id)
    }

    /// Fraction of images handled, 1.0 for an empty document
    pub fn progress(&self) -> f32 {
        match self.runner.total() {
            0 => 1.0,
            total => self.runner.loaded_count() as f32 / total as f32,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.runner.state()
    }

    pub fn stats(&self) -> RunnerStats {
        self.runner.stats()
    }

    /// Whether a scroll monitor is worth attaching
    pub fn wants_scroll_events(&self) -> bool {
        self.config.auto_image_display
            && self.runner.total() > self.config.prefetch_slice_size
            && !self.runner.is_complete()
    }

    /// First classification after render
    pub async fn start(&mut self) -> SessionStatus {
        if !self.config.auto_image_display {
            tracing::info!("Automatic image display disabled; {} image(s) left as placeholders", self.total());
            return SessionStatus::Manual;
        }
        self.classify_and_pump().await
    }

    /// Re-run classification after the viewport settled.
    ///
    /// No-op while a round is in progress or once everything is loaded.
    pub async fn on_scroll_settled(&mut self) -> SessionStatus {
        if !self.config.auto_image_display {
            return SessionStatus::Manual;
        }
        if self.runner.is_busy() {
            tracing::debug!("Ignoring scroll while a round is in progress");
            return SessionStatus::Busy;
        }
        if self.runner.state() == RunnerState::Done {
            return SessionStatus::Done;
        }
        self.classify_and_pump().await
    }

    /// Run the session against a scroll monitor until every image is
    /// handled or the monitor goes away
    pub async fn drive(&mut self, monitor: &mut ScrollMonitor) -> SessionStatus {
        let mut status = self.start().await;
        if !self.wants_scroll_events() {
            monitor.detach();
            return status;
        }

        while matches!(status, SessionStatus::Idle | SessionStatus::Busy) && monitor.settled().await {
            status = self.on_scroll_settled().await;
        }
        if status == SessionStatus::Done {
            monitor.detach();
        }
        status
    }

    /// Load one placeholder on request and apply it to the view.
    ///
    /// Independent of any round. The image counts as handled either way.
    pub async fn load_on_demand(&mut self, id: PlaceholderId) -> Result<Resource, ImageError> {
        let image = self.placeholder(id)?;
        tracing::info!("Loading image on request: {}", image.source_title);

        match fetch(&self.store, &image.source_title).await {
            Ok(resource) => {
                self.view.apply_content(id, &resource.content, &resource.mime_type);
                self.runner.record(id, Outcome::Loaded);
                Ok(resource)
            }
            Err(err) => {
                tracing::warn!("Could not load {}: {}", image.source_title, err);
                self.runner.record(id, Outcome::Failed);
                Err(err.into())
            }
        }
    }

    /// Resolve a placeholder's bytes without touching the view or counters
    pub async fn resolve_raw(&self, id: PlaceholderId) -> Result<Resource, ImageError> {
        let image = self.placeholder(id)?;
        Ok(fetch(&self.store, &image.source_title).await?)
    }

    fn placeholder(&self, id: PlaceholderId) -> Result<ImageRef, ImageError> {
        self.view
            .list_placeholders()
            .into_iter()
            .find(|image| image.id == id)
            .ok_or(ImageError::UnknownPlaceholder(id))
    }

    async fn classify_and_pump(&mut self) -> SessionStatus {
        plan_round(&self.view, &mut self.runner, &self.config);
        self.pump().await
    }

    /// Drive the runner until it rests
    async fn pump(&mut self) -> SessionStatus {
        let Self { store, view, config, runner } = self;
        let store = &*store;
        let executor = LocalExecutor::new();
        let (tx, rx) = smol::channel::unbounded::<Completion>();

        executor
            .run(async {
                loop {
                    let step = runner.next_step(|candidates| {
                        VisibilityWindow::scan(candidates, |image| view.is_visible(image.id))
                    });

                    match step {
                        Step::Dispatch(batch) => {
                            let token = batch.token;
                            for image in batch.images {
                                let tx = tx.clone();
                                executor
                                    .spawn(async move {
                                        let result = fetch(store, &image.source_title).await;
                                        let _ = tx
                                            .send(Completion {
                                                token,
                                                id: image.id,
                                                title: image.source_title,
                                                result,
                                            })
                                            .await;
                                    })
                                    .detach();
                            }
                        }
                        Step::Pending => {
                            // The loop holds a sender, so the channel never closes here.
                            let Ok(completion) = rx.recv().await else {
                                return SessionStatus::Idle;
                            };
                            settle(view, runner, completion);
                        }
                        Step::Typeset { token, images } => {
                            let resolved: Vec<PlaceholderId> = images
                                .iter()
                                .filter(|image| {
                                    image.typesettable().is_some_and(|tex| view.typeset(image.id, tex))
                                })
                                .map(|image| image.id)
                                .collect();
                            runner.typeset_resolved(token, &resolved);
                        }
                        Step::Abandoned => {
                            plan_round(&*view, runner, config);
                        }
                        Step::Idle => return SessionStatus::Idle,
                        Step::Done => return SessionStatus::Done,
                    }
                }
            })
            .await
    }
}

/// Classify the outstanding placeholders and start a round, or rest
fn plan_round<V: ViewAdapter>(view: &V, runner: &mut SliceRunner, config: &ImageConfig) -> RunnerState {
    let images: Vec<ImageRef> = view
        .list_placeholders()
        .into_iter()
        .map(|mut image| {
            image.class = if view.mark_vector_fallback(&image) {
                ResourceClass::VectorFallback
            } else {
                ResourceClass::Raster
            };
            image
        })
        .collect();

    let classification = prepare(
        &images,
        |id| runner.is_settled(id),
        |image| view.is_visible(image.id),
        config,
    );

    match classification {
        Classification::Round { queues, window, candidates } => {
            runner.begin_round(queues, window, candidates);
            runner.state()
        }
        Classification::Waiting | Classification::Exhausted => runner.rest(),
    }
}

/// Apply one fetch result and report it to the runner
fn settle<V: ViewAdapter>(view: &mut V, runner: &mut SliceRunner, completion: Completion) {
    let Completion { token, id, title, result } = completion;

    let outcome = match &result {
        Ok(_) => Outcome::Loaded,
        Err(err) => {
            tracing::warn!("Image {} not loaded: {}", title, err);
            Outcome::Failed
        }
    };

    let effect = runner.complete(token, id, outcome);
    if effect == CompletionEffect::Duplicate {
        return;
    }
    if let Ok(resource) = result {
        tracing::debug!("Extracted image {} ({} bytes)", title, resource.len());
        view.apply_content(id, &resource.content, &resource.mime_type);
    }
}
