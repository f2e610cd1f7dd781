//! Round-robin windowing over the tracked-campaign list.
//!
//! Both coherence loops own an independent instance: the reconciler windows
//! who gets stale-checked this tick, the subscription manager windows who
//! holds a live stream. Rotation state is process-local; after a restart
//! selection resumes from the start of the list, which degrades fairness
//! slightly but never to starvation.

use std::sync::Mutex;

/// Rotating window selector over an ID list.
///
/// When the list exceeds the cap, consecutive calls walk the list as a
/// ring, so every ID is selected at least once every
/// `ceil(len / cap)` calls regardless of list ordering.
#[derive(Debug, Default)]
pub struct RoundRobinWindow {
    next_index: Mutex<usize>,
}

impl RoundRobinWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects up to `cap` IDs, advancing the rotation cursor.
    ///
    /// A `cap` of 0 means unbounded; when the whole list fits within the
    /// cap it is returned unchanged and the cursor is left untouched.
    pub fn select<T: Clone>(&self, ids: &[T], cap: usize) -> Vec<T> {
        if cap == 0 || ids.len() <= cap {
            return ids.to_vec();
        }

        let mut next_index = self.next_index.lock().unwrap();
        let start = *next_index % ids.len();
        let window = (0..cap)
            .map(|offset| ids[(start + offset) % ids.len()].clone())
            .collect();
        *next_index = (start + cap) % ids.len();
        window
    }
}
