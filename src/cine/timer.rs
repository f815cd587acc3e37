use std::collections::BTreeMap;
use std::time::Duration;

use crate::cine::signal::{LaneId, SignalId};

/// What a timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Reveal(SignalId),
    Rewind(LaneId),
}

/// Owned handle to a scheduled task.
///
/// Not `Clone`: whoever holds the handle is the only party that can start,
/// stop or cancel the task.
#[derive(Debug, PartialEq, Eq)]
pub struct TaskHandle {
    id: u64,
}

#[derive(Debug)]
struct Task {
    kind: TaskKind,
    interval: Duration,
    due: Option<Duration>, // None while stopped
}

/// Single-threaded periodic timers on a virtual clock.
///
/// Time only moves through [`Scheduler::pop_due`] and [`Scheduler::settle`],
/// so a task that is stopped or cancelled between two pops can never fire
/// again.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    tasks: BTreeMap<u64, Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Registers a stopped task.
    pub fn create(&mut self, kind: TaskKind, interval: Duration) -> TaskHandle {
        debug_assert!(!interval.is_zero(), "timer interval must be positive");
        self.next_id += 1;
        let id = self.next_id;
        self.tasks.insert(
            id,
            Task {
                kind,
                interval: interval.max(Duration::from_millis(1)),
                due: None,
            },
        );
        TaskHandle { id }
    }

    pub fn start(&mut self, handle: &TaskHandle) {
        if let Some(task) = self.tasks.get_mut(&handle.id) {
            debug_assert!(task.due.is_none(), "timer {:?} started twice", task.kind);
            if task.due.is_none() {
                task.due = Some(self.now + task.interval);
            }
        }
    }

    pub fn stop(&mut self, handle: &TaskHandle) {
        if let Some(task) = self.tasks.get_mut(&handle.id) {
            task.due = None;
        }
    }

    pub fn is_active(&self, handle: &TaskHandle) -> bool {
        self.tasks
            .get(&handle.id)
            .is_some_and(|task| task.due.is_some())
    }

    /// Changes the period; a running task restarts its countdown from now.
    pub fn set_interval(&mut self, handle: &TaskHandle, interval: Duration) {
        if let Some(task) = self.tasks.get_mut(&handle.id) {
            task.interval = interval.max(Duration::from_millis(1));
            if task.due.is_some() {
                task.due = Some(self.now + task.interval);
            }
        }
    }

    pub fn cancel(&mut self, handle: TaskHandle) {
        self.tasks.remove(&handle.id);
    }

    pub fn active_count(&self) -> usize {
        self.tasks.values().filter(|t| t.due.is_some()).count()
    }

    /// Fires the earliest task due at or before `deadline`.
    ///
    /// Advances the clock to the task's due time and reschedules it one
    /// interval later. Ties go to the task created first.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<TaskKind> {
        let (id, due) = self
            .tasks
            .iter()
            .filter_map(|(id, task)| task.due.map(|due| (*id, due)))
            .filter(|(_, due)| *due <= deadline)
            .min_by_key(|(id, due)| (*due, *id))?;
        let task = self.tasks.get_mut(&id)?;
        self.now = self.now.max(due);
        task.due = Some(due + task.interval);
        Some(task.kind)
    }

    /// Moves the clock to `deadline` once every due task has fired.
    pub fn settle(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_in_due_order() {
        let mut scheduler = Scheduler::new();
        let fast = scheduler.create(TaskKind::Reveal(SignalId(1)), ms(5));
        let slow = scheduler.create(TaskKind::Rewind(LaneId::Left), ms(20));
        scheduler.start(&fast);
        scheduler.start(&slow);

        let mut fired = Vec::new();
        while let Some(kind) = scheduler.pop_due(ms(20)) {
            fired.push(kind);
        }
        scheduler.settle(ms(20));
        assert_eq!(
            fired,
            vec![
                TaskKind::Reveal(SignalId(1)),
                TaskKind::Reveal(SignalId(1)),
                TaskKind::Reveal(SignalId(1)),
                TaskKind::Reveal(SignalId(1)),
                TaskKind::Rewind(LaneId::Left),
            ]
        );
        assert_eq!(scheduler.now(), ms(20));
    }

    #[test]
    fn stopped_and_cancelled_tasks_never_fire() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.create(TaskKind::Reveal(SignalId(1)), ms(10));
        let b = scheduler.create(TaskKind::Reveal(SignalId(2)), ms(10));
        scheduler.start(&a);
        scheduler.start(&b);
        assert_eq!(scheduler.pop_due(ms(10)), Some(TaskKind::Reveal(SignalId(1))));
        scheduler.stop(&a);
        scheduler.cancel(b);
        assert_eq!(scheduler.pop_due(ms(100)), None);
        assert!(!scheduler.is_active(&a));
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn restart_counts_from_current_time() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.create(TaskKind::Reveal(SignalId(1)), ms(10));
        scheduler.settle(ms(95));
        scheduler.start(&a);
        assert_eq!(scheduler.pop_due(ms(104)), None);
        assert_eq!(scheduler.pop_due(ms(105)), Some(TaskKind::Reveal(SignalId(1))));
        scheduler.set_interval(&a, ms(50));
        assert_eq!(scheduler.pop_due(ms(154)), None);
        assert!(scheduler.pop_due(ms(155)).is_some());
    }
}
