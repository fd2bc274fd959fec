//! Deferred work, run from the view's tick.

use std::time::Instant;

/// A deferred step of a rebuild or navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task<E> {
    /// Re-query a node after expanding its folded ancestors
    RetryNavigate { path: String },
    /// Remove scroll offset and highlight styling once a heading scroll settled
    ClearHeadingStyling { element: E },
    /// Fit the whole diagram once the first layout is in place
    Fit,
}

#[derive(Debug, Clone)]
struct Scheduled<E> {
    due: Instant,
    task: Task<E>,
}

/// Queue of tasks keyed by due time.
#[derive(Debug, Clone)]
pub struct Timers<E> {
    queue: Vec<Scheduled<E>>,
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self { queue: Vec::new() }
    }
}

impl<E: PartialEq> Timers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` at `due`. An identical pending task is rescheduled instead.
    pub fn schedule(&mut self, due: Instant, task: Task<E>) {
        match self.queue.iter_mut().find(|s| s.task == task) {
            Some(existing) => existing.due = due,
            None => self.queue.push(Scheduled { due, task }),
        }
    }

    /// Remove and return every task due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<Task<E>> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.queue.drain(..).partition(|s| s.due <= now);
        self.queue = pending;
        due.sort_by_key(|s| s.due);
        due.into_iter().map(|s| s.task).collect()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.queue.iter().map(|s| s.due).min()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
