// ⏲️ Delayed Tasks - Cancellable, deadline-based callbacks
//
// Nothing here spawns threads. Tasks sit in a queue with a due time and
// the owner pulls the ones that are due (`take_due`) from its own loop,
// so expiry runs on the same context as every other mutation.
//
// Time comes from a `Clock`, so tests can advance it by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// CLOCKS
// ============================================================================

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time (monotonic)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same elapsed time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

// ============================================================================
// TASK QUEUE
// ============================================================================

/// Handle returned by `schedule`, used to cancel that one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct PendingTask<T> {
    handle: TaskHandle,
    due: Instant,
    payload: T,
}

/// Queue of payloads, each released once its delay has elapsed.
///
/// Dropping the queue cancels everything still pending.
pub struct DelayedTasks<T> {
    clock: Arc<dyn Clock>,
    next_handle: u64,
    pending: Vec<PendingTask<T>>,
}

impl<T> DelayedTasks<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        DelayedTasks {
            clock,
            next_handle: 0,
            pending: Vec::new(),
        }
    }

    /// Queue `payload` to become due after `delay`
    pub fn schedule(&mut self, payload: T, delay: Duration) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;

        let now = self.clock.now();
        let due = now.checked_add(delay).unwrap_or(now);
        self.pending.push(PendingTask { handle, due, payload });
        handle
    }

    /// Cancel one task; false if it already ran or was cancelled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|task| task.handle != handle);
        self.pending.len() != before
    }

    /// Cancel everything, returning how many tasks were dropped
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Remove and return every payload whose due time has passed,
    /// earliest first (ties in scheduling order)
    pub fn take_due(&mut self) -> Vec<T> {
        let now = self.clock.now();

        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|task| task.due <= now);
        self.pending = waiting;

        due.sort_by_key(|task| (task.due, task.handle.0));
        due.into_iter().map(|task| task.payload).collect()
    }

    /// Earliest pending due time
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|task| task.due).min()
    }

    /// Time left before `handle` fires, zero if already due
    pub fn remaining(&self, handle: TaskHandle) -> Option<Duration> {
        let now = self.clock.now();
        self.pending
            .iter()
            .find(|task| task.handle == handle)
            .map(|task| task.due.saturating_duration_since(now))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> (ManualClock, DelayedTasks<&'static str>) {
        let clock = ManualClock::new();
        let tasks = DelayedTasks::new(Arc::new(clock.clone()));
        (clock, tasks)
    }

    #[test]
    fn test_nothing_due_before_delay() {
        let (clock, mut tasks) = queue();
        tasks.schedule("a", Duration::from_secs(1));

        clock.advance(Duration::from_millis(999));

        assert!(tasks.take_due().is_empty());
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_due_after_delay_and_only_once() {
        let (clock, mut tasks) = queue();
        tasks.schedule("a", Duration::from_secs(1));

        clock.advance(Duration::from_secs(1));

        assert_eq!(tasks.take_due(), vec!["a"]);
        assert!(tasks.take_due().is_empty());
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_independent_tasks_release_in_due_order() {
        let (clock, mut tasks) = queue();
        tasks.schedule("late", Duration::from_millis(300));
        tasks.schedule("early", Duration::from_millis(100));
        tasks.schedule("middle", Duration::from_millis(200));

        clock.advance(Duration::from_millis(250));
        assert_eq!(tasks.take_due(), vec!["early", "middle"]);

        clock.advance(Duration::from_millis(50));
        assert_eq!(tasks.take_due(), vec!["late"]);
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let (clock, mut tasks) = queue();
        let keep = tasks.schedule("keep", Duration::from_secs(1));
        let dropped = tasks.schedule("drop", Duration::from_secs(1));

        assert!(tasks.cancel(dropped));
        assert!(!tasks.cancel(dropped));

        clock.advance(Duration::from_secs(2));
        assert_eq!(tasks.take_due(), vec!["keep"]);
        assert!(!tasks.cancel(keep));
    }

    #[test]
    fn test_cancel_all() {
        let (clock, mut tasks) = queue();
        tasks.schedule("a", Duration::from_secs(1));
        tasks.schedule("b", Duration::from_secs(2));

        assert_eq!(tasks.cancel_all(), 2);

        clock.advance(Duration::from_secs(5));
        assert!(tasks.take_due().is_empty());
    }

    #[test]
    fn test_next_deadline_and_remaining() {
        let (clock, mut tasks) = queue();
        assert_eq!(tasks.next_deadline(), None);

        let start = clock.now();
        let handle = tasks.schedule("a", Duration::from_secs(1));
        tasks.schedule("b", Duration::from_secs(3));

        assert_eq!(tasks.next_deadline(), Some(start + Duration::from_secs(1)));

        clock.advance(Duration::from_millis(400));
        assert_eq!(tasks.remaining(handle), Some(Duration::from_millis(600)));

        clock.advance(Duration::from_secs(1));
        assert_eq!(tasks.remaining(handle), Some(Duration::ZERO));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();

        other.advance(Duration::from_secs(2));

        assert_eq!(clock.elapsed(), Duration::from_secs(2));
        assert_eq!(clock.now(), other.now());
    }
}
