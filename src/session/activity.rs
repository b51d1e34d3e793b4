//! Advisory inactivity timeout
//!
//! [`ActivityTracker`] keeps the instant of the last qualifying operation and
//! a deferred task that flips a shared flag once the inactivity window has
//! passed. Every [`touch`](ActivityTracker::touch) aborts the armed task and
//! arms a new one. The flag is observable state only; nothing is blocked by
//! it.
//!
//! ```text
//!            touch()                    window elapsed
//!   Active <---------- TimedOut <------------------- Active
//!      |                                               ^
//!      +------------------- touch() -------------------+
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Tracks idle time against a fixed window.
#[derive(Debug)]
pub struct ActivityTracker {
    window: Duration,
    last_activity: Mutex<Instant>,
    timed_out: Arc<AtomicBool>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl ActivityTracker {
    /// Create a tracker. No timer is armed until the first `touch`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_activity: Mutex::new(Instant::now()),
            timed_out: Arc::new(AtomicBool::new(false)),
            timer: Mutex::new(None),
        }
    }

    /// The inactivity window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record activity: clear the flag and re-arm the deferred transition.
    ///
    /// Outside a tokio runtime only the timestamp is updated; [`check`]
    /// still detects idleness.
    ///
    /// [`check`]: ActivityTracker::check
    pub fn touch(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Instant::now();
        }
        self.timed_out.store(false, Ordering::Release);

        let Ok(mut timer) = self.timer.lock() else {
            return;
        };
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let flag = self.timed_out.clone();
            let window = self.window;
            *timer = Some(runtime.spawn(async move {
                // idle must exceed the window, not just reach it
                tokio::time::sleep(window + Duration::from_millis(1)).await;
                flag.store(true, Ordering::Release);
                tracing::info!(window_ms = window.as_millis() as u64, "Session inactive");
            }));
        }
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }

    /// Compare idle time against the window now, updating the flag.
    pub fn check(&self) -> bool {
        if self.idle_for() > self.window {
            self.timed_out.store(true, Ordering::Release);
        }
        self.is_timed_out()
    }

    /// Current value of the flag.
    pub fn is_timed_out(&self) -> bool {
        self.timed_out.load(Ordering::Acquire)
    }

    /// Abort the armed timer, if any.
    pub fn cancel(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }

    /// Whether a deferred transition is currently armed.
    pub fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .map(|t| t.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for ActivityTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}
