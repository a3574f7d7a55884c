//! Scheduler configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ImageError;

/// Image loading options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageConfig {
    /// Maximum number of visible images requested in one batch
    pub visible_slice_cap: usize,

    /// Number of offscreen images prefetched after the visible ones
    pub prefetch_slice_size: usize,

    /// Vector/math fallback images requested per round
    pub vector_batch_size: usize,

    /// Quiet period before a scroll counts as settled
    pub scroll_debounce_ms: u64,

    /// Run the scheduler automatically after render
    pub auto_image_display: bool,

    /// Typeset math fallbacks from their textual form instead of fetching
    pub typeset_math: bool,

    /// How close (in images) the last visible loaded image must be to the
    /// unloaded remainder for a round to start with nothing visible
    pub resume_threshold: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            visible_slice_cap: 10,
            prefetch_slice_size: 20,
            vector_batch_size: 3,
            scroll_debounce_ms: 250,
            auto_image_display: true,
            typeset_math: false,
            resume_threshold: 5,
        }
    }
}

impl ImageConfig {
    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    /// Reject sizes that would stall the pipeline
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.visible_slice_cap == 0 {
            return Err(ImageError::InvalidConfig("visibleSliceCap must be at least 1".into()));
        }
        if self.vector_batch_size == 0 {
            return Err(ImageError::InvalidConfig("vectorBatchSize must be at least 1".into()));
        }
        Ok(())
    }
}
