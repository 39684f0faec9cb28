use foundation::time::Time;

use crate::frame::Frame;

/// Identifier of a scheduled task, usable for cancellation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Due {
    /// Runs on the first frame whose index is greater than this one.
    AfterFrame(u64),
    /// Runs on the first frame whose start time reaches the deadline.
    At(Time),
}

#[derive(Debug)]
struct Task<T> {
    id: TaskId,
    due: Due,
    payload: T,
}

impl<T> Task<T> {
    fn is_due(&self, frame: Frame) -> bool {
        match self.due {
            Due::AfterFrame(index) => frame.index > index,
            Due::At(deadline) => frame.time >= deadline,
        }
    }

    // Total ordering: next-frame work first, then timers by deadline, then insertion.
    fn order_key(&self) -> (u8, u64, TaskId) {
        match self.due {
            Due::AfterFrame(_) => (0, 0, self.id),
            Due::At(deadline) => (1, deadline.ms(), self.id),
        }
    }
}

/// Deterministic cooperative scheduler.
///
/// Two kinds of deferral are supported:
/// - [`Scheduler::defer`]: run on the next frame tick (the "next paint" slot).
/// - [`Scheduler::schedule_after`]: cancellable timer with a millisecond delay.
///
/// Nothing runs by itself. The owner calls [`Scheduler::advance`] once per frame
/// and applies the returned payloads in order.
#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    tasks: Vec<Task<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, due: Due, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tasks.push(Task { id, due, payload });
        id
    }

    /// Schedules `payload` for the frame after `current`.
    pub fn defer(&mut self, current: Frame, payload: T) -> TaskId {
        self.push(Due::AfterFrame(current.index), payload)
    }

    /// Schedules `payload` to run once `delay_ms` has elapsed after `now`.
    pub fn schedule_after(&mut self, now: Time, delay_ms: u64, payload: T) -> TaskId {
        self.push(Due::At(now.add_ms(delay_ms)), payload)
    }

    /// Cancels a pending task. Returns `false` if it already ran or never existed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Cancels every pending task and returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Removes and returns every payload due at `frame`, in execution order.
    pub fn advance(&mut self, frame: Frame) -> Vec<T> {
        let (mut due, keep): (Vec<Task<T>>, Vec<Task<T>>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| t.is_due(frame));
        self.tasks = keep;
        due.sort_by_key(|t| t.order_key());
        due.into_iter().map(|t| t.payload).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Scheduler;
    use crate::frame::Frame;
    use foundation::time::Time;

    #[test]
    fn deferred_work_runs_on_next_frame_only() {
        let mut s = Scheduler::new();
        let f0 = Frame::new(0, 16);
        s.defer(f0, "commit");

        assert!(s.advance(f0).is_empty());
        assert_eq!(s.advance(f0.next()), vec!["commit"]);
        assert!(s.is_empty());
    }

    #[test]
    fn deferred_work_keeps_insertion_order() {
        let mut s = Scheduler::new();
        let f0 = Frame::new(3, 16);
        s.defer(f0, "a");
        s.defer(f0, "b");
        s.defer(f0, "c");
        assert_eq!(s.advance(f0.next()), vec!["a", "b", "c"]);
    }

    #[test]
    fn timer_fires_at_deadline_not_before() {
        let mut s = Scheduler::new();
        s.schedule_after(Time(0), 800, "exit");

        assert!(s.advance(Frame::new(49, 16)).is_empty()); // 784ms
        assert_eq!(s.advance(Frame::new(50, 16)), vec!["exit"]); // 800ms
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut s = Scheduler::new();
        let id = s.schedule_after(Time(0), 100, "exit");
        assert!(s.is_pending(id));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.advance(Frame::new(100, 16)).is_empty());
    }

    #[test]
    fn deferred_before_timers_and_timers_by_deadline() {
        let mut s = Scheduler::new();
        let f = Frame::new(10, 10);
        s.schedule_after(Time(0), 50, "late-timer");
        s.schedule_after(Time(0), 20, "early-timer");
        s.defer(f, "next-frame");
        assert_eq!(
            s.advance(f.next()),
            vec!["next-frame", "early-timer", "late-timer"]
        );
    }

    #[test]
    fn cancel_all_reports_count() {
        let mut s = Scheduler::new();
        s.defer(Frame::new(0, 16), 1);
        s.schedule_after(Time(0), 5, 2);
        assert_eq!(s.cancel_all(), 2);
        assert!(s.is_empty());
    }
}
