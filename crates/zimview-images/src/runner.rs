//! Slice Runner
//!
//! State machine that drains one classification round: `Visible`, then
//! `Prefetch`, then `VectorFallback` in small sequential rounds. It performs
//! no I/O itself. The session driver asks for the next [`Step`], executes it,
//! and reports completions back.
//!
//! Every round owns a [`RoundToken`]. Starting a round invalidates the
//! previous token, so completions that arrive late from an abandoned round are
//! recognized as stale: they still settle their image in the global ledger
//! (once), but never advance the current round's batch.

use std::collections::{HashMap, HashSet};

use crate::{ImageConfig, ImageRef, PlaceholderId, SliceKind, SliceQueues, VisibilityWindow};

/// Identifies one classification round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundToken(u64);

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// No work queued; images may remain
    Idle,
    Visible,
    Prefetch,
    VectorFallback,
    /// Every image of the document has been handled
    Done,
}

/// A set of images dispatched to the store together.
///
/// Completions are matched back by placeholder, never by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceBatch {
    pub token: RoundToken,
    pub kind: SliceKind,
    pub images: Vec<ImageRef>,
}

impl SliceBatch {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// What the driver should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Fetch every image of the batch
    Dispatch(SliceBatch),
    /// Try the in-place typeset fast path on these math fallbacks, then
    /// report the ones that succeeded
    Typeset { token: RoundToken, images: Vec<ImageRef> },
    /// A batch is still outstanding; wait for a completion
    Pending,
    /// The viewport moved during vector rounds; the rest of the vector queue
    /// was dropped and the caller must classify again
    Abandoned,
    /// Round finished with images left for later
    Idle,
    /// All images handled
    Done,
}

/// Fetch result of one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Loaded,
    Failed,
}

/// Effect of reporting a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    /// First completion of this image, counted in the current round
    Counted,
    /// First completion of this image, but from an abandoned round
    Stale,
    /// Image was already settled; nothing changed
    Duplicate,
}

/// Counters over the runner's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStats {
    pub rounds: usize,
    pub abandoned_rounds: usize,
    pub batches: usize,
    pub vector_rounds: usize,
    pub typeset: usize,
    pub failed: usize,
    pub stale_completions: usize,
}

#[derive(Debug)]
struct BatchProgress {
    kind: SliceKind,
    declared: usize,
    completed: usize,
    pending: HashSet<PlaceholderId>,
}

impl BatchProgress {
    fn is_drained(&self) -> bool {
        self.completed == self.declared
    }
}

/// Scheduling core for one document
#[derive(Debug)]
pub struct SliceRunner {
    config: ImageConfig,
    total: usize,
    loaded: HashSet<PlaceholderId>,
    in_flight: HashMap<PlaceholderId, RoundToken>,
    generation: u64,
    state: RunnerState,
    queues: SliceQueues,
    batch: Option<BatchProgress>,
    window: VisibilityWindow,
    candidates: Vec<ImageRef>,
    typeset_offered: bool,
    /// A vector round of the current classification has been dispatched
    vector_dispatched: bool,
    stats: RunnerStats,
}

impl SliceRunner {
    pub fn new(total: usize, config: ImageConfig) -> Self {
        Self {
            config,
            total,
            loaded: HashSet::new(),
            in_flight: HashMap::new(),
            generation: 0,
            state: if total == 0 { RunnerState::Done } else { RunnerState::Idle },
            queues: SliceQueues::default(),
            batch: None,
            window: VisibilityWindow::NONE,
            candidates: Vec::new(),
            typeset_offered: false,
            vector_dispatched: false,
            stats: RunnerStats::default(),
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn token(&self) -> RoundToken {
        RoundToken(self.generation)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn stats(&self) -> RunnerStats {
        self.stats
    }

    pub fn queues(&self) -> &SliceQueues {
        &self.queues
    }

    /// Window captured when the current round was classified
    pub fn window(&self) -> VisibilityWindow {
        self.window
    }

    pub fn is_loaded(&self, id: PlaceholderId) -> bool {
        self.loaded.contains(&id)
    }

    /// Loaded or currently being fetched
    pub fn is_settled(&self, id: PlaceholderId) -> bool {
        self.loaded.contains(&id) || self.in_flight.contains_key(&id)
    }

    /// A round is in progress
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            RunnerState::Visible | RunnerState::Prefetch | RunnerState::VectorFallback
        )
    }

    pub fn is_complete(&self) -> bool {
        self.loaded.len() >= self.total
    }

    /// Start a new round, invalidating any previous one
    pub fn begin_round(
        &mut self,
        queues: SliceQueues,
        window: VisibilityWindow,
        candidates: Vec<ImageRef>,
    ) -> RoundToken {
        self.generation += 1;
        if let Some(batch) = self.batch.take() {
            tracing::debug!(
                "Dropping {:?} batch with {} outstanding image(s)",
                batch.kind,
                batch.pending.len()
            );
        }

        self.queues = queues;
        self.window = window;
        self.candidates = candidates;
        self.typeset_offered = false;
        self.vector_dispatched = false;
        self.state = RunnerState::Visible;
        self.stats.rounds += 1;

        tracing::info!(
            "Round {}: {} visible, {} prefetch, {} vector image(s)",
            self.generation,
            self.queues.visible.len(),
            self.queues.prefetch.len(),
            self.queues.vector.len()
        );
        self.token()
    }

    /// Leave the runner idle (or done) without starting a round
    pub fn rest(&mut self) -> RunnerState {
        self.queues = SliceQueues::default();
        self.batch = None;
        self.state = if self.is_complete() { RunnerState::Done } else { RunnerState::Idle };
        self.state
    }

    /// Advance the pipeline.
    ///
    /// `window_of` recomputes the visibility window over the round's candidate
    /// list; it is only consulted around vector rounds.
    pub fn next_step(&mut self, mut window_of: impl FnMut(&[ImageRef]) -> VisibilityWindow) -> Step {
        if let Some(batch) = &self.batch {
            if !batch.is_drained() {
                return Step::Pending;
            }
            self.batch = None;
        }

        loop {
            match self.state {
                RunnerState::Idle => return Step::Idle,
                RunnerState::Done => return Step::Done,
                RunnerState::Visible => {
                    let cap = self.config.visible_slice_cap;
                    if let Some(batch) = self.take_batch(SliceKind::Visible, cap) {
                        tracing::info!("Accessing {} visible image(s)...", batch.len());
                        return Step::Dispatch(batch);
                    }
                    self.state = RunnerState::Prefetch;
                }
                RunnerState::Prefetch => {
                    let all = self.queues.prefetch.len();
                    if let Some(batch) = self.take_batch(SliceKind::Prefetch, all) {
                        tracing::info!("Prefetching {} offscreen image(s)...", batch.len());
                        return Step::Dispatch(batch);
                    }
                    self.state = RunnerState::VectorFallback;
                }
                RunnerState::VectorFallback => return self.vector_step(&mut window_of),
            }
        }
    }

    fn vector_step(&mut self, window_of: &mut impl FnMut(&[ImageRef]) -> VisibilityWindow) -> Step {
        if self.queues.vector.is_empty() {
            // The window is checked after the last vector round as well
            if self.vector_dispatched && !self.is_complete() && window_of(&self.candidates) != self.window {
                return self.abandon();
            }
            return self.finish_round();
        }

        if self.config.typeset_math && !self.typeset_offered {
            self.typeset_offered = true;
            let math: Vec<ImageRef> = self
                .queues
                .vector
                .iter()
                .filter(|image| image.typesettable().is_some())
                .cloned()
                .collect();
            if !math.is_empty() {
                return Step::Typeset {
                    token: self.token(),
                    images: math,
                };
            }
        }

        if window_of(&self.candidates) != self.window {
            return self.abandon();
        }

        let size = self.config.vector_batch_size;
        match self.take_batch(SliceKind::VectorFallback, size) {
            Some(batch) => {
                self.vector_dispatched = true;
                self.stats.vector_rounds += 1;
                tracing::debug!("Requesting batch of {} vector image(s)...", batch.len());
                Step::Dispatch(batch)
            }
            None => self.finish_round(),
        }
    }

    fn abandon(&mut self) -> Step {
        tracing::info!(
            "Abandoning {} vector image(s) due to user scroll",
            self.queues.vector.len()
        );
        self.queues.vector.clear();
        self.state = RunnerState::Idle;
        self.stats.abandoned_rounds += 1;
        Step::Abandoned
    }

    fn finish_round(&mut self) -> Step {
        if self.is_complete() {
            tracing::info!("All {} images extracted from current document", self.total);
            self.state = RunnerState::Done;
            Step::Done
        } else {
            tracing::info!(
                "All requested slices processed ({}/{}), waiting for user scroll",
                self.loaded.len(),
                self.total
            );
            self.state = RunnerState::Idle;
            Step::Idle
        }
    }

    fn take_batch(&mut self, kind: SliceKind, max: usize) -> Option<SliceBatch> {
        let queue = self.queues.queue_mut(kind);
        let n = max.min(queue.len());
        if n == 0 {
            return None;
        }

        let images: Vec<ImageRef> = queue.drain(..n).collect();
        let token = self.token();
        for image in &images {
            self.in_flight.insert(image.id, token);
        }

        self.batch = Some(BatchProgress {
            kind,
            declared: images.len(),
            completed: 0,
            pending: images.iter().map(|image| image.id).collect(),
        });
        self.stats.batches += 1;

        Some(SliceBatch { token, kind, images })
    }

    /// Report one finished fetch (success or failure)
    pub fn complete(&mut self, token: RoundToken, id: PlaceholderId, outcome: Outcome) -> CompletionEffect {
        if self.in_flight.get(&id) == Some(&token) {
            self.in_flight.remove(&id);
        }

        let first_time = self.loaded.insert(id);
        if first_time && outcome == Outcome::Failed {
            self.stats.failed += 1;
        }

        if token != self.token() {
            if first_time {
                self.stats.stale_completions += 1;
                tracing::debug!("Late completion for {:?} from an abandoned round", id);
                return CompletionEffect::Stale;
            }
            return CompletionEffect::Duplicate;
        }

        if let Some(batch) = &mut self.batch {
            if batch.pending.remove(&id) {
                batch.completed += 1;
                if batch.is_drained() {
                    tracing::debug!("{:?} batch of {} drained", batch.kind, batch.declared);
                }
            }
        }

        if first_time {
            CompletionEffect::Counted
        } else {
            CompletionEffect::Duplicate
        }
    }

    /// Report math fallbacks resolved by the typeset fast path
    pub fn typeset_resolved(&mut self, token: RoundToken, ids: &[PlaceholderId]) {
        if token != self.token() {
            return;
        }

        self.queues.vector.retain(|image| !ids.contains(&image.id));
        for id in ids {
            if self.loaded.insert(*id) {
                self.stats.typeset += 1;
            }
        }
        tracing::debug!("Typeset {} formula(s) in place", ids.len());
    }

    /// Record an image loaded outside of any round (on-demand request)
    pub fn record(&mut self, id: PlaceholderId, outcome: Outcome) -> bool {
        self.in_flight.remove(&id);
        let first_time = self.loaded.insert(id);
        if first_time && outcome == Outcome::Failed {
            self.stats.failed += 1;
        }
        if self.is_complete() && !self.is_busy() {
            self.state = RunnerState::Done;
        }
        first_time
    }
}
