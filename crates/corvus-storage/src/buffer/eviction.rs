//! LRU-K eviction policy for the buffer pool.
//!
//! LRU-K evicts the frame with the largest *backward k-distance*: the
//! gap between the current timestamp and a frame's k-th most recent
//! access. A frame with fewer than `k` recorded accesses has an
//! infinite k-distance; among those, the one whose earliest access is
//! oldest loses, which degenerates to classical LRU. Compared to plain
//! LRU this keeps a page with a real reuse history resident when a
//! one-touch scan sweeps through the pool.
//!
//! Timestamps come from a pool-wide logical clock that ticks on every
//! recorded access, so the order over accesses is total.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use super::frame::FrameId;

/// Access history and eviction eligibility for one frame.
struct AccessEntry {
    /// Up to `k` access timestamps, oldest first.
    history: VecDeque<u64>,
    /// Whether the pool currently allows this frame to be evicted.
    evictable: bool,
}

struct ReplacerState {
    entries: HashMap<FrameId, AccessEntry>,
    /// Logical clock; incremented on every recorded access.
    ticks: u64,
    /// Number of entries with `evictable = true`.
    evictable: usize,
}

/// LRU-K replacement policy over the pool's frames.
///
/// The replacer owns its bookkeeping outright, keyed by frame id; the
/// frame array itself stays with the pool. Victim selection re-scans
/// the entry table, which is bounded by the pool size.
///
/// Frames enter the replacer through [`record_access`] (non-evictable
/// until the pool says otherwise) and leave through [`evict`] or
/// [`remove`].
///
/// [`record_access`]: LruKReplacer::record_access
/// [`evict`]: LruKReplacer::evict
/// [`remove`]: LruKReplacer::remove
pub struct LruKReplacer {
    /// Upper bound on tracked frame ids (the pool size).
    num_frames: usize,
    /// How many accesses back the k-distance looks.
    k: usize,
    state: Mutex<ReplacerState>,
}

impl LruKReplacer {
    /// Creates a replacer for a pool of `num_frames` frames.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "replacer k must be at least 1");
        Self {
            num_frames,
            k,
            state: Mutex::new(ReplacerState {
                entries: HashMap::new(),
                ticks: 0,
                evictable: 0,
            }),
        }
    }

    /// Records an access to `frame_id` at the current tick, creating a
    /// non-evictable entry if the frame is not yet tracked.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range; that is a caller bug, not
    /// a runtime condition.
    pub fn record_access(&self, frame_id: FrameId) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();
        let tick = state.ticks;
        state.ticks += 1;

        match state.entries.get_mut(&frame_id) {
            Some(entry) => {
                if entry.history.len() == self.k {
                    entry.history.pop_front();
                }
                entry.history.push_back(tick);
            }
            None => {
                let mut history = VecDeque::with_capacity(self.k);
                history.push_back(tick);
                state.entries.insert(
                    frame_id,
                    AccessEntry {
                        history,
                        evictable: false,
                    },
                );
            }
        }
    }

    /// Sets whether `frame_id` may be evicted, adjusting the evictable
    /// count only on actual transitions.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range or not tracked.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();
        let entry = state
            .entries
            .get_mut(&frame_id)
            .unwrap_or_else(|| panic!("set_evictable: frame {frame_id:?} is not tracked"));

        if entry.evictable != evictable {
            entry.evictable = evictable;
            if evictable {
                state.evictable += 1;
            } else {
                state.evictable -= 1;
            }
        }
    }

    /// Evicts the evictable frame with the largest backward k-distance,
    /// dropping its history. Returns `None` if no frame is evictable.
    pub fn evict(&self) -> Option<FrameId> {
        let mut state = self.state.lock();
        if state.evictable == 0 {
            return None;
        }

        let now = state.ticks;
        // (frame, k-distance, earliest access); `None` distance is +inf.
        let mut victim: Option<(FrameId, Option<u64>, u64)> = None;
        for (&frame_id, entry) in &state.entries {
            if !entry.evictable {
                continue;
            }
            let earliest = *entry
                .history
                .front()
                .expect("tracked frame has at least one access");
            let distance = if entry.history.len() < self.k {
                None
            } else {
                Some(now - entry.history[entry.history.len() - self.k])
            };

            let better = match &victim {
                None => true,
                Some((_, best_distance, best_earliest)) => match (distance, *best_distance) {
                    (None, None) => earliest < *best_earliest,
                    (None, Some(_)) => true,
                    (Some(_), None) => false,
                    (Some(d), Some(b)) => d > b || (d == b && earliest < *best_earliest),
                },
            };
            if better {
                victim = Some((frame_id, distance, earliest));
            }
        }

        let (frame_id, _, _) = victim.expect("evictable count was positive");
        state.entries.remove(&frame_id);
        state.evictable -= 1;
        Some(frame_id)
    }

    /// Drops a specific evictable frame from the replacer. Untracked
    /// frames are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range, or if the frame is tracked
    /// but not evictable.
    pub fn remove(&self, frame_id: FrameId) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();
        let Some(entry) = state.entries.get(&frame_id) else {
            return;
        };
        assert!(
            entry.evictable,
            "remove: frame {frame_id:?} is not evictable"
        );
        state.entries.remove(&frame_id);
        state.evictable -= 1;
    }

    /// Number of frames currently evictable.
    pub fn size(&self) -> usize {
        self.state.lock().evictable
    }

    fn check_frame_id(&self, frame_id: FrameId) {
        assert!(
            frame_id.index() <= self.num_frames,
            "frame {frame_id:?} is out of range for a pool of {} frames",
            self.num_frames
        );
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LruKReplacer")
            .field("num_frames", &self.num_frames)
            .field("k", &self.k)
            .field("tracked", &state.entries.len())
            .field("evictable", &state.evictable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[usize]) -> Vec<FrameId> {
        raw.iter().copied().map(FrameId::new).collect()
    }

    #[test]
    fn test_evict_empty() {
        let replacer = LruKReplacer::new(4, 2);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_infinite_distance_tie_break() {
        // Access A, B, C once each, then A again. Everything below k=2
        // accesses is +inf except A, so the victim is the +inf frame
        // with the oldest first access: B.
        let replacer = LruKReplacer::new(4, 2);
        let [a, b, c] = [FrameId::new(0), FrameId::new(1), FrameId::new(2)];

        replacer.record_access(a);
        replacer.record_access(b);
        replacer.record_access(c);
        replacer.record_access(a);
        for f in [a, b, c] {
            replacer.set_evictable(f, true);
        }

        assert_eq!(replacer.evict(), Some(b));
        assert_eq!(replacer.evict(), Some(c));
        assert_eq!(replacer.evict(), Some(a));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_k_distance_ignores_recency_past_k() {
        // With k=2: A accessed at ticks 0 and 3, B at 1 and 2. A's
        // second-most-recent access is older, so A is the victim even
        // though it was touched most recently.
        let replacer = LruKReplacer::new(4, 2);
        let [a, b] = [FrameId::new(0), FrameId::new(1)];

        replacer.record_access(a); // tick 0
        replacer.record_access(b); // tick 1
        replacer.record_access(b); // tick 2
        replacer.record_access(a); // tick 3... A history = [0, 3]
        replacer.set_evictable(a, true);
        replacer.set_evictable(b, true);

        assert_eq!(replacer.evict(), Some(a));
    }

    #[test]
    fn test_history_bounded_to_k() {
        // Enough accesses roll the oldest timestamps out of the window:
        // after many touches of A its k-distance is small again.
        let replacer = LruKReplacer::new(4, 2);
        let [a, b] = [FrameId::new(0), FrameId::new(1)];

        replacer.record_access(a);
        replacer.record_access(a);
        replacer.record_access(b);
        replacer.record_access(b);
        replacer.record_access(a);
        replacer.record_access(a);
        replacer.set_evictable(a, true);
        replacer.set_evictable(b, true);

        // B's window is [2, 3], A's is [4, 5]: B is further back.
        assert_eq!(replacer.evict(), Some(b));
    }

    #[test]
    fn test_set_evictable_transitions_size() {
        let replacer = LruKReplacer::new(4, 2);
        for f in ids(&[0, 1, 2]) {
            replacer.record_access(f);
        }
        assert_eq!(replacer.size(), 0);

        replacer.set_evictable(FrameId::new(0), true);
        replacer.set_evictable(FrameId::new(1), true);
        assert_eq!(replacer.size(), 2);

        // Repeating a state is not a transition.
        replacer.set_evictable(FrameId::new(0), true);
        assert_eq!(replacer.size(), 2);

        replacer.set_evictable(FrameId::new(0), false);
        assert_eq!(replacer.size(), 1);
    }

    #[test]
    fn test_non_evictable_frames_survive_eviction() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.record_access(FrameId::new(0));
        replacer.record_access(FrameId::new(1));
        replacer.set_evictable(FrameId::new(1), true);

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        // Frame 0 was never evictable and is still tracked.
        assert_eq!(replacer.evict(), None);
        replacer.set_evictable(FrameId::new(0), true);
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    }

    #[test]
    fn test_remove() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.record_access(FrameId::new(0));
        replacer.set_evictable(FrameId::new(0), true);
        assert_eq!(replacer.size(), 1);

        replacer.remove(FrameId::new(0));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);

        // Removing an untracked frame is a no-op.
        replacer.remove(FrameId::new(3));
    }

    #[test]
    #[should_panic(expected = "not evictable")]
    fn test_remove_non_evictable_panics() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.record_access(FrameId::new(0));
        replacer.remove(FrameId::new(0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_record_access_out_of_range_panics() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.record_access(FrameId::new(17));
    }

    #[test]
    #[should_panic(expected = "not tracked")]
    fn test_set_evictable_unknown_panics() {
        let replacer = LruKReplacer::new(4, 2);
        replacer.set_evictable(FrameId::new(0), true);
    }
}
