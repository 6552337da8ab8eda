use std::time::Duration;

use crate::PulseTimer;

/// Identifier of a task registered with a [`TaskQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: TaskId,
    due: Duration,
    period: Duration,
}

/// Virtual-time queue of repeating tasks.
///
/// The queue never reads a clock itself. Drivers feed it the current time via
/// [`TaskQueue::set_now`] (a wall clock in the terminal front end, a synthetic
/// one in tests) and drain whatever became due with [`TaskQueue::pop_due`].
#[derive(Debug, Default)]
pub struct TaskQueue {
    now: Duration,
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Advances the queue clock. Time never moves backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Registers a task first due one `period` from now.
    pub fn schedule_repeating(&mut self, period: Duration) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            due: self.now.saturating_add(period),
            period,
        });
        id
    }

    /// Removes a task. Returns `false` if it was not scheduled.
    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn period(&self, id: TaskId) -> Option<Duration> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .map(|task| task.period)
    }

    /// Earliest deadline among scheduled tasks.
    pub fn next_due(&self) -> Option<Duration> {
        self.tasks.iter().map(|task| task.due).min()
    }

    /// Pops the earliest task due at or before the current time and re-arms
    /// it one period later.
    pub fn pop_due(&mut self) -> Option<TaskId> {
        let now = self.now;
        let task = self
            .tasks
            .iter_mut()
            .filter(|task| task.due <= now)
            .min_by_key(|task| task.due)?;

        // A zero period would otherwise stay due forever.
        task.due = task
            .due
            .saturating_add(task.period.max(Duration::from_millis(1)));
        Some(task.id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl PulseTimer for TaskQueue {
    type Handle = TaskId;

    fn every(&mut self, period: Duration) -> TaskId {
        self.schedule_repeating(period)
    }

    fn cancel(&mut self, handle: TaskId) {
        self.cancel_task(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn repeating_task_rearms_each_period() {
        let mut queue = TaskQueue::new();
        let id = queue.schedule_repeating(ms(250));

        queue.set_now(ms(249));
        assert_eq!(queue.pop_due(), None);

        queue.set_now(ms(1000));
        let mut fired = 0;
        while let Some(task) = queue.pop_due() {
            assert_eq!(task, id);
            fired += 1;
        }
        assert_eq!(fired, 4);
        assert_eq!(queue.next_due(), Some(ms(1250)));
    }

    #[test]
    fn earliest_task_fires_first() {
        let mut queue = TaskQueue::new();
        let slow = queue.schedule_repeating(ms(300));
        let fast = queue.schedule_repeating(ms(100));

        queue.set_now(ms(300));
        assert_eq!(queue.pop_due(), Some(fast));
        assert_eq!(queue.pop_due(), Some(fast));
        assert_eq!(queue.pop_due(), Some(slow));
        assert_eq!(queue.pop_due(), Some(fast));
        assert_eq!(queue.pop_due(), None);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut queue = TaskQueue::new();
        let id = queue.schedule_repeating(ms(10));
        assert!(queue.cancel_task(id));
        assert!(!queue.cancel_task(id));

        queue.set_now(ms(100));
        assert_eq!(queue.pop_due(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn huge_period_never_comes_due() {
        let mut queue = TaskQueue::new();
        queue.set_now(ms(10));
        queue.schedule_repeating(Duration::MAX);

        assert_eq!(queue.next_due(), Some(Duration::MAX));
        queue.set_now(ms(1_000_000));
        assert_eq!(queue.pop_due(), None);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut queue = TaskQueue::new();
        queue.set_now(ms(500));
        queue.set_now(ms(200));
        assert_eq!(queue.now(), ms(500));

        let id = queue.schedule_repeating(ms(100));
        assert_eq!(queue.next_due(), Some(ms(600)));
        assert_eq!(queue.period(id), Some(ms(100)));
    }
}
