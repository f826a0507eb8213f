//! Cooperative timing: sample throttling and cancellable scheduled tasks.
//!
//! Nothing here spawns or sleeps. Deadlines are plain `Instant`s that the host's
//! frame loop polls through `tick(now)`.

use std::time::{Duration, Instant};

/// Rate limiter for high-frequency samples such as scroll positions.
///
/// At most one sample is applied per interval. A sample that arrives inside the
/// interval is held as the trailing sample and released by [`flush`](Self::flush),
/// so the final position of a burst is never lost.
#[derive(Debug, Clone)]
pub struct SampleThrottle<T> {
    interval: Duration,
    last_applied: Option<Instant>,
    pending: Option<T>,
}

impl<T> SampleThrottle<T> {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_applied: None,
            pending: None,
        }
    }

    /// Offer a sample. Returns it when it may be applied now; otherwise keeps
    /// it as the trailing sample (replacing any older one).
    pub fn offer(&mut self, now: Instant, sample: T) -> Option<T> {
        if self.is_open(now) {
            self.last_applied = Some(now);
            self.pending = None;
            Some(sample)
        } else {
            self.pending = Some(sample);
            None
        }
    }

    /// Release the trailing sample once the interval has passed.
    pub fn flush(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.is_open(now) {
            self.last_applied = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn is_open(&self, now: Instant) -> bool {
        self.last_applied
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Work a session defers to a later frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Hide the transient notice.
    DismissNotice,
    /// The minimum display time of a practice step has passed.
    StepElapsed { step: usize },
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: TaskId,
    due: Instant,
    action: TaskAction,
}

/// A session's pending timers. Doubles as its teardown list: dropping a
/// session's work means [`cancel_all`](Self::cancel_all).
#[derive(Debug, Default)]
pub struct TaskList {
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

impl TaskList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, action: TaskAction) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tasks.push(ScheduledTask { id, due, action });
        id
    }

    /// Returns `true` if the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    /// Cancel every pending task whose action matches `predicate`.
    pub fn cancel_matching(&mut self, predicate: impl Fn(&TaskAction) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !predicate(&task.action));
        before - self.tasks.len()
    }

    /// Remove and return every task due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TaskAction> {
        let mut due: Vec<ScheduledTask> = Vec::new();
        self.tasks.retain(|task| {
            if task.due <= now {
                due.push(task.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|task| (task.due, task.id));
        due.into_iter().map(|task| task.action).collect()
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.tasks.len();
        self.tasks.clear();
        cancelled
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.iter().map(|task| task.due).min()
    }
}
