//! Loop guard for runaway load triggers.
//!
//! A misbehaving scroll trigger can fire page requests back to back. The guard
//! counts triggers inside a rolling detection window and, once the count hits
//! the configured maximum, enters a cooldown. While cooling off the caller is
//! expected to ignore triggers; the guard only reports the condition.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// Loop guard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopGuardConfig {
    /// Triggers inside one detection window that count as a loop.
    pub loop_max_calls: u32,
    /// Quiet period after which the trigger count drops back to zero.
    pub loop_detection_timeout: Duration,
    /// How long the cooldown lasts once a loop is detected.
    pub loop_timeout: Duration,
}

impl Default for LoopGuardConfig {
    fn default() -> Self {
        Self {
            loop_max_calls: 5,
            loop_detection_timeout: Duration::from_millis(2000),
            loop_timeout: Duration::from_millis(3000),
        }
    }
}

impl LoopGuardConfig {
    /// Create config with custom values.
    pub fn new(loop_max_calls: u32, loop_detection_timeout: Duration, loop_timeout: Duration) -> Self {
        Self {
            loop_max_calls,
            loop_detection_timeout,
            loop_timeout,
        }
    }
}

/// Point-in-time view of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTrackerSnapshot {
    pub count: u32,
    pub cooling_off: bool,
    pub pending_timers: usize,
}

#[derive(Debug, Default)]
struct LoopTracker {
    count: u32,
    cooling_off: bool,
    /// Bumped on every trigger; timers scheduled under an older generation do nothing.
    generation: u64,
    cooldown_until: Option<Instant>,
    timers: Vec<JoinHandle<()>>,
}

impl LoopTracker {
    fn cancel_timers(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
    }
}

/// Counts load triggers and forces a cooldown after a burst.
///
/// Timers run as tokio tasks, so [`LoopGuard::track`] must be called from
/// inside a tokio runtime.
#[derive(Debug)]
pub struct LoopGuard {
    config: LoopGuardConfig,
    tracker: Arc<Mutex<LoopTracker>>,
}

impl LoopGuard {
    pub fn new(config: LoopGuardConfig) -> Self {
        Self {
            config,
            tracker: Arc::new(Mutex::new(LoopTracker::default())),
        }
    }

    pub fn config(&self) -> &LoopGuardConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, LoopTracker> {
        lock_tracker(&self.tracker)
    }

    /// Record one trigger.
    ///
    /// Cancels pending timers, restarts the detection window and, if the count
    /// reached `loop_max_calls`, starts the cooldown.
    pub fn track(&self) {
        let mut tracker = self.lock();
        tracker.count += 1;
        tracker.generation += 1;
        tracker.cancel_timers();

        let now = Instant::now();
        let generation = tracker.generation;
        let window = self.schedule(now + self.config.loop_detection_timeout, generation, |t| {
            t.count = 0;
        });
        tracker.timers.push(window);

        if tracker.count >= self.config.loop_max_calls {
            log::warn!(
                "Loop detected: {} load triggers within {:?}, cooling off for {:?}",
                tracker.count,
                self.config.loop_detection_timeout,
                self.config.loop_timeout
            );
            tracker.cooling_off = true;
            tracker.cooldown_until = Some(now + self.config.loop_timeout);
        }

        // A trigger during an active cooldown keeps the deadline it already had
        if let Some(deadline) = tracker.cooldown_until.filter(|_| tracker.cooling_off) {
            let cooldown = self.schedule(deadline, generation, |t| {
                t.cooling_off = false;
                t.cooldown_until = None;
                t.count = 0;
                log::debug!("Loop cooldown finished");
            });
            tracker.timers.push(cooldown);
        }
    }

    fn schedule<F>(&self, deadline: Instant, generation: u64, on_expiry: F) -> JoinHandle<()>
    where
        F: FnOnce(&mut LoopTracker) + Send + 'static,
    {
        let tracker = Arc::clone(&self.tracker);
        tokio::spawn(async move {
            sleep_until(deadline).await;
            let mut tracker = lock_tracker(&tracker);
            if tracker.generation == generation {
                on_expiry(&mut *tracker);
            }
        })
    }

    /// Triggers seen in the current detection window.
    pub fn count(&self) -> u32 {
        self.lock().count
    }

    /// Returns true while the cooldown is active.
    pub fn is_cooling_off(&self) -> bool {
        self.lock().cooling_off
    }

    pub fn snapshot(&self) -> LoopTrackerSnapshot {
        let tracker = self.lock();
        LoopTrackerSnapshot {
            count: tracker.count,
            cooling_off: tracker.cooling_off,
            pending_timers: tracker.timers.iter().filter(|t| !t.is_finished()).count(),
        }
    }

    /// Drop pending timers and return to idle.
    ///
    /// Nothing is left to clear `count` or `cooling_off` once the timers are
    /// gone, so both are reset here.
    pub fn cancel_all(&self) {
        let mut tracker = self.lock();
        tracker.generation += 1;
        tracker.cancel_timers();
        tracker.count = 0;
        tracker.cooling_off = false;
        tracker.cooldown_until = None;
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(LoopGuardConfig::default())
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.lock().cancel_timers();
    }
}

fn lock_tracker(tracker: &Mutex<LoopTracker>) -> MutexGuard<'_, LoopTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}
