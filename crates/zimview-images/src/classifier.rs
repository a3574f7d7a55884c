//! Slice Classifier
//!
//! Sorts the outstanding images of a document into the three work queues of
//! one classification round.

use std::collections::VecDeque;

use crate::{ImageConfig, ImageRef, PlaceholderId, VisibilityWindow};

/// Work queue kinds, in drain order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SliceKind {
    Visible,
    Prefetch,
    VectorFallback,
}

/// The three queues of one classification round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceQueues {
    pub visible: VecDeque<ImageRef>,
    pub prefetch: VecDeque<ImageRef>,
    pub vector: VecDeque<ImageRef>,
}

impl SliceQueues {
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.prefetch.is_empty() && self.vector.is_empty()
    }

    pub fn len(&self) -> usize {
        self.visible.len() + self.prefetch.len() + self.vector.len()
    }

    pub fn queue(&self, kind: SliceKind) -> &VecDeque<ImageRef> {
        match kind {
            SliceKind::Visible => &self.visible,
            SliceKind::Prefetch => &self.prefetch,
            SliceKind::VectorFallback => &self.vector,
        }
    }

    pub(crate) fn queue_mut(&mut self, kind: SliceKind) -> &mut VecDeque<ImageRef> {
        match kind {
            SliceKind::Visible => &mut self.visible,
            SliceKind::Prefetch => &mut self.prefetch,
            SliceKind::VectorFallback => &mut self.vector,
        }
    }
}

/// Result of preparing a classification round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Every image has been handled
    Exhausted,
    /// Nothing near the viewport needs loading; wait for a scroll
    Waiting,
    /// Work to do. `window` is the visibility captured for this round and
    /// `candidates` the list it indexes into.
    Round {
        queues: SliceQueues,
        window: VisibilityWindow,
        candidates: Vec<ImageRef>,
    },
}

/// Prepare a round from the full placeholder list.
///
/// `settled` reports images that are loaded (or already being fetched) and
/// must not be queued again.
pub fn prepare(
    images: &[ImageRef],
    settled: impl Fn(PlaceholderId) -> bool,
    mut is_visible: impl FnMut(&ImageRef) -> bool,
    config: &ImageConfig,
) -> Classification {
    let mut candidates = Vec::new();
    let mut settled_seen = 0;
    let mut last_visible_settled = None;

    for image in images {
        if settled(image.id) {
            if is_visible(image) {
                last_visible_settled = Some(settled_seen);
            }
            settled_seen += 1;
        } else {
            candidates.push(image.clone());
        }
    }

    if candidates.is_empty() {
        tracing::info!("No images need prefetching");
        return Classification::Exhausted;
    }

    tracing::debug!("Processing {} images...", candidates.len());
    let window = VisibilityWindow::scan(&candidates, &mut is_visible);
    if window.is_empty() {
        // Nothing outstanding is in view. Keep going only if the viewer sits
        // close to the loaded frontier, or if nothing on screen tells us where
        // they are.
        if let Some(rank) = last_visible_settled {
            if settled_seen - rank > config.resume_threshold {
                tracing::info!("Waiting for user to scroll");
                return Classification::Waiting;
            }
        }
    }

    let queues = triage(&candidates, window, config);
    Classification::Round {
        queues,
        window,
        candidates,
    }
}

/// Batching routine: split the window around `window` into queues.
///
/// The window ends `prefetch_slice_size` images past the last visible one and
/// starts at the first visible one. When it would overrun the list it is
/// shifted back instead of shortened.
pub fn triage(candidates: &[ImageRef], window: VisibilityWindow, config: &ImageConfig) -> SliceQueues {
    let len = candidates.len() as isize;
    let first = window.first.map_or(-1, |f| f as isize);
    let last = window.last.map_or(-1, |l| l as isize);

    let mut end = last + config.prefetch_slice_size as isize + 1;
    let mut start = first;
    if end > len {
        start -= end - len;
        end = len;
    }
    let start = start.max(0) as usize;
    let end = end.max(0) as usize;

    let mut queues = SliceQueues::default();
    let mut vector_outside = VecDeque::new();

    for (i, image) in candidates.iter().enumerate().take(end).skip(start) {
        let in_view = window.contains(i);
        if image.is_vector_fallback() {
            if in_view {
                queues.vector.push_back(image.clone());
            } else {
                vector_outside.push_back(image.clone());
            }
        } else if in_view && queues.visible.len() < config.visible_slice_cap {
            queues.visible.push_back(image.clone());
        } else {
            queues.prefetch.push_back(image.clone());
        }
    }
    queues.vector.extend(vector_outside);

    tracing::debug!(
        "Triaged window #{}..#{}: {} visible, {} prefetch, {} vector",
        start,
        end,
        queues.visible.len(),
        queues.prefetch.len(),
        queues.vector.len()
    );
    queues
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn raster(n: usize) -> Vec<ImageRef> {
        (0..n).map(|i| ImageRef::raster(i, &format!("I/m/{}.png", i))).collect()
    }

    fn ids(queue: &VecDeque<ImageRef>) -> Vec<usize> {
        queue.iter().map(|img| img.id.0).collect()
    }

    #[test]
    fn test_triage_all_visible() {
        let list = raster(5);
        let queues = triage(&list, VisibilityWindow::new(0, 4), &ImageConfig::default());
        assert_eq!(ids(&queues.visible), vec![0, 1, 2, 3, 4]);
        assert!(queues.prefetch.is_empty());
        assert!(queues.vector.is_empty());
    }

    #[test]
    fn test_triage_visible_then_prefetch() {
        let list = raster(50);
        let queues = triage(&list, VisibilityWindow::new(10, 17), &ImageConfig::default());
        assert_eq!(ids(&queues.visible), (10..=17).collect::<Vec<_>>());
        assert_eq!(ids(&queues.prefetch), (18..=37).collect::<Vec<_>>());
    }

    #[test]
    fn test_triage_shifts_window_back_at_end() {
        let list = raster(30);
        let queues = triage(&list, VisibilityWindow::new(25, 29), &ImageConfig::default());
        assert_eq!(ids(&queues.visible), (25..=29).collect::<Vec<_>>());
        assert_eq!(ids(&queues.prefetch), (5..=24).collect::<Vec<_>>());
    }

    #[test]
    fn test_triage_visible_cap_overflows_to_prefetch() {
        let list = raster(15);
        let queues = triage(&list, VisibilityWindow::new(0, 14), &ImageConfig::default());
        assert_eq!(queues.visible.len(), 10);
        assert_eq!(ids(&queues.prefetch), (10..=14).collect::<Vec<_>>());
    }

    #[test]
    fn test_triage_without_window() {
        let list = raster(40);
        let queues = triage(&list, VisibilityWindow::NONE, &ImageConfig::default());
        assert!(queues.visible.is_empty());
        assert_eq!(ids(&queues.prefetch), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_triage_vector_inside_first() {
        let mut list = raster(8);
        list[1] = ImageRef::new(PlaceholderId(1), "I/m/f1.svg", "", None);
        list[3] = ImageRef::new(PlaceholderId(3), "I/m/f3.svg", "", None);
        list[6] = ImageRef::new(PlaceholderId(6), "I/m/f6.svg", "", None);

        let queues = triage(&list, VisibilityWindow::new(2, 4), &ImageConfig::default());
        assert_eq!(ids(&queues.vector), vec![3, 1, 6]);
        assert_eq!(ids(&queues.visible), vec![2, 4]);
        assert_eq!(ids(&queues.prefetch), vec![0, 5, 7]);
    }

    #[test]
    fn test_prepare_exhausted() {
        let list = raster(3);
        let result = prepare(&list, |_| true, |_| true, &ImageConfig::default());
        assert_eq!(result, Classification::Exhausted);
    }

    #[test]
    fn test_prepare_filters_settled() {
        let list = raster(6);
        let loaded: HashSet<usize> = [0, 1].into_iter().collect();
        let result = prepare(
            &list,
            |id| loaded.contains(&id.0),
            |img| img.id.0 < 4,
            &ImageConfig::default(),
        );

        let Classification::Round { queues, window, candidates } = result else {
            panic!("expected a round");
        };
        assert_eq!(candidates.len(), 4);
        assert_eq!(window, VisibilityWindow::new(0, 1));
        assert_eq!(ids(&queues.visible), vec![2, 3]);
        assert_eq!(ids(&queues.prefetch), vec![4, 5]);
    }

    #[test]
    fn test_prepare_waits_far_from_frontier() {
        // 0..=9 loaded, viewer looking at #1: eight loaded images lie between
        // the viewport and the first unloaded one.
        let list = raster(20);
        let result = prepare(&list, |id| id.0 < 10, |img| img.id.0 == 1, &ImageConfig::default());
        assert_eq!(result, Classification::Waiting);
    }

    #[test]
    fn test_prepare_resumes_near_frontier() {
        let list = raster(20);
        let result = prepare(&list, |id| id.0 < 10, |img| img.id.0 == 7, &ImageConfig::default());
        let Classification::Round { queues, window, .. } = result else {
            panic!("expected a round");
        };
        assert!(window.is_empty());
        assert_eq!(ids(&queues.prefetch), (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_prepare_resume_threshold_configurable() {
        let list = raster(20);
        let tight = ImageConfig { resume_threshold: 1, ..Default::default() };
        let result = prepare(&list, |id| id.0 < 10, |img| img.id.0 == 7, &tight);
        assert!(matches!(result, Classification::Waiting));

        // Three loaded images sit between the viewer and the frontier.
        let exact = ImageConfig { resume_threshold: 3, ..Default::default() };
        let result = prepare(&list, |id| id.0 < 10, |img| img.id.0 == 7, &exact);
        assert!(matches!(result, Classification::Round { .. }));
    }

    #[test]
    fn test_prepare_unknown_position_fetches() {
        let list = raster(30);
        let result = prepare(&list, |_| false, |_| false, &ImageConfig::default());
        let Classification::Round { queues, .. } = result else {
            panic!("expected a round");
        };
        assert_eq!(queues.prefetch.len(), 20);
    }
}
