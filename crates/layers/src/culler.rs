use foundation::time::Time;
use runtime::{Frame, Scheduler, TaskId};
use scene::{Region, RegionAtlas};
use tracing::debug;

/// How an observation changed the rendering scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeChange {
    /// Scope switched to this state in the same pass (no frame gap).
    Entered(String),
    /// Selection cleared; the scope is kept until the timer fires at `at`.
    ExitScheduled { at: Time },
    /// A pending exit was cancelled because the same state came back.
    ExitCancelled,
    Unchanged,
}

/// Decides which districts stay mounted.
///
/// Drilling in is instant: the scope follows the selected state on the same
/// observation. Zooming out is lazy: the scope is cleared only after
/// `exit_delay_ms`, so outgoing districts can fade while the camera moves.
/// At most one exit timer is live at a time.
#[derive(Debug)]
pub struct GracefulExit {
    rendering_scope: Option<String>,
    exit_delay_ms: u64,
    timers: Scheduler<()>,
    exit_timer: Option<TaskId>,
}

impl GracefulExit {
    pub fn new(exit_delay_ms: u64) -> Self {
        Self {
            rendering_scope: None,
            exit_delay_ms,
            timers: Scheduler::new(),
            exit_timer: None,
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.rendering_scope.as_deref()
    }

    pub fn exit_pending(&self) -> bool {
        self.exit_timer.is_some()
    }

    pub fn observe(&mut self, selected_state: Option<&str>, now: Time) -> ScopeChange {
        match selected_state {
            Some(state) => {
                let cancelled = self.cancel_exit();
                if self.rendering_scope.as_deref() == Some(state) {
                    return if cancelled {
                        ScopeChange::ExitCancelled
                    } else {
                        ScopeChange::Unchanged
                    };
                }
                self.rendering_scope = Some(state.to_string());
                debug!(scope = state, "district scope entered");
                ScopeChange::Entered(state.to_string())
            }
            None => {
                if self.rendering_scope.is_none() || self.exit_timer.is_some() {
                    return ScopeChange::Unchanged;
                }
                let at = now.add_ms(self.exit_delay_ms);
                self.exit_timer = Some(self.timers.schedule_after(now, self.exit_delay_ms, ()));
                debug!(at = at.ms(), "district scope exit scheduled");
                ScopeChange::ExitScheduled { at }
            }
        }
    }

    /// Fires the exit timer when due. Returns `true` if the scope was cleared.
    pub fn tick(&mut self, frame: Frame) -> bool {
        if self.timers.advance(frame).is_empty() {
            return false;
        }
        self.exit_timer = None;
        if let Some(scope) = self.rendering_scope.take() {
            debug!(scope = %scope, "district scope cleared");
        }
        true
    }

    /// Districts to mount for the current scope, in atlas order.
    pub fn visible_districts<'a>(&'a self, atlas: &'a RegionAtlas) -> Vec<&'a Region> {
        match self.rendering_scope.as_deref() {
            Some(scope) => atlas.districts_of(scope).collect(),
            None => Vec::new(),
        }
    }

    fn cancel_exit(&mut self) -> bool {
        match self.exit_timer.take() {
            Some(id) => self.timers.cancel(id),
            None => false,
        }
    }
}
