//! In-time pileup from the per-crossing pileup summaries.

use btv_core::PileupFrame;

/// Pileup value used before any in-time frame has been seen.
pub const INITIAL_PILEUP: i32 = 0;

/// True-interaction count of the first in-time (`bunch_crossing == 0`)
/// frame, truncated toward zero.
pub fn find_in_time(frames: &[PileupFrame]) -> Option<i32> {
    frames.iter().find(|f| f.bunch_crossing == 0).map(|f| f.true_num_interactions as i32)
}

/// Holds the pileup value across events.
///
/// An event without an in-time frame keeps the previous event's value (or
/// [`INITIAL_PILEUP`] if none was ever resolved).
#[derive(Debug, Clone)]
pub struct PileupResolver {
    current: i32,
}

impl Default for PileupResolver {
    fn default() -> Self {
        Self { current: INITIAL_PILEUP }
    }
}

impl PileupResolver {
    /// Resolver starting at [`INITIAL_PILEUP`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from this event's frames and return the value to use.
    pub fn resolve(&mut self, frames: &[PileupFrame]) -> i32 {
        match find_in_time(frames) {
            Some(pu) => self.current = pu,
            None => {
                tracing::debug!(
                    n_frames = frames.len(),
                    retained = self.current,
                    "no in-time pileup frame; keeping previous value"
                );
            }
        }
        self.current
    }

    /// Last resolved value.
    pub fn current(&self) -> i32 {
        self.current
    }
}
