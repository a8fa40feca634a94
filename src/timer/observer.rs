//! Callback interface notified on every timer fire.
use crate::core::TimerId;

/// Target of a timer's fire events.
///
/// The timer only keeps a `Weak` reference to its observer: it never keeps
/// the observer alive, and silently stops delivering once the observer is
/// dropped. Delivery happens on the scheduler's execution context, so the
/// observer must be thread-safe.
///
/// The firing timer's [`TimerId`] is passed along so one observer can serve
/// several timers and tell them apart.
///
/// Closures implement the trait:
///
/// ```
/// use std::sync::Arc;
/// use dispatch_timer::{TimerId, TimerObserver};
///
/// let observer: Arc<dyn TimerObserver> = Arc::new(|timer: TimerId| {
///     let _ = timer;
/// });
/// observer.timer_fired(TimerId::from_raw(1));
/// ```
pub trait TimerObserver: Send + Sync {
    /// Called once per fire of `timer`.
    fn timer_fired(&self, timer: TimerId);
}

impl<F> TimerObserver for F
where
    F: Fn(TimerId) + Send + Sync,
{
    fn timer_fired(&self, timer: TimerId) {
        self(timer)
    }
}
