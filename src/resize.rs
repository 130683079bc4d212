//! Debounced resize settlement for the petal canvas

use std::time::{Duration, Instant};

/// Watches the canvas size and reports exactly once when resizing has
/// settled: a changed sample restarts the quiet period, and settlement fires
/// only when the size has stayed put for the whole period. While the size
/// keeps changing the watcher keeps re-arming and never settles.
pub struct ResizeWatcher {
    settle: Duration,
    pending: Option<Pending>,
}

struct Pending {
    sample: (f32, f32),
    deadline: Instant,
}

impl ResizeWatcher {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            pending: None,
        }
    }

    /// Poll with the size the surface reports and the size currently applied
    /// to the field. Returns true once, when the caller should reinitialize.
    pub fn observe(&mut self, current: (f32, f32), applied: (f32, f32), now: Instant) -> bool {
        match &mut self.pending {
            None => {
                if current != applied {
                    self.pending = Some(Pending {
                        sample: current,
                        deadline: now + self.settle,
                    });
                }
                false
            }
            Some(pending) => {
                if current != pending.sample {
                    pending.sample = current;
                    pending.deadline = now + self.settle;
                    false
                } else if now >= pending.deadline {
                    self.pending = None;
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(300);

    #[test]
    fn stable_size_never_arms() {
        let mut watcher = ResizeWatcher::new(SETTLE);
        let now = Instant::now();
        for i in 0..10 {
            let t = now + Duration::from_millis(i * 100);
            assert!(!watcher.observe((800.0, 600.0), (800.0, 600.0), t));
        }
    }

    #[test]
    fn settles_after_a_quiet_period() {
        let mut watcher = ResizeWatcher::new(SETTLE);
        let now = Instant::now();

        assert!(!watcher.observe((900.0, 600.0), (800.0, 600.0), now));
        assert!(!watcher.observe(
            (900.0, 600.0),
            (800.0, 600.0),
            now + Duration::from_millis(100)
        ));
        assert!(watcher.observe(
            (900.0, 600.0),
            (800.0, 600.0),
            now + Duration::from_millis(301)
        ));
        // Settled once; after the caller applies the size it stays idle.
        assert!(!watcher.observe(
            (900.0, 600.0),
            (900.0, 600.0),
            now + Duration::from_millis(400)
        ));
    }

    #[test]
    fn changed_sample_restarts_the_timer() {
        let mut watcher = ResizeWatcher::new(SETTLE);
        let now = Instant::now();

        assert!(!watcher.observe((900.0, 600.0), (800.0, 600.0), now));
        // Still dragging at the original deadline: no settlement.
        assert!(!watcher.observe(
            (950.0, 600.0),
            (800.0, 600.0),
            now + Duration::from_millis(300)
        ));
        assert!(!watcher.observe(
            (950.0, 600.0),
            (800.0, 600.0),
            now + Duration::from_millis(500)
        ));
        assert!(watcher.observe(
            (950.0, 600.0),
            (800.0, 600.0),
            now + Duration::from_millis(601)
        ));
    }

    #[test]
    fn continuous_resizing_never_settles() {
        let mut watcher = ResizeWatcher::new(SETTLE);
        let now = Instant::now();
        for i in 0..100u64 {
            let size = (800.0 + i as f32, 600.0);
            let t = now + Duration::from_millis(i * 1000);
            assert!(!watcher.observe(size, (640.0, 480.0), t));
        }
    }
}
