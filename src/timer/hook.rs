//! Injectable lifecycle hook. Off unless a hook is passed to
//! [`TimerBuilder::with_hook`](crate::timer::TimerBuilder::with_hook); the
//! core has no global logger of its own.
use crate::core::{TimerEvent, TimerId};

/// Receives every [`TimerEvent`] of the timers it is injected into.
///
/// Called outside the timer's internal lock, possibly from the scheduler's
/// execution context (`Fired`, and `Invalidated` for fire-once timers).
pub trait TimerHook: Send + Sync {
    fn on_event(&self, timer: TimerId, event: &TimerEvent);
}

impl<F> TimerHook for F
where
    F: Fn(TimerId, &TimerEvent) + Send + Sync,
{
    fn on_event(&self, timer: TimerId, event: &TimerEvent) {
        self(timer, event)
    }
}
