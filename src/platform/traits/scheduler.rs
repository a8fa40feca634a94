//! Factory side of the platform timer capability. Allows the library to plug
//! into various implementations (tokio runtime, embedded executor, OS timer
//! queue, test double...).
use embassy_time::Duration;

use crate::platform::traits::source::TimerSource;

/// Contract to allocate a recurring or one-shot timer source.
pub trait TimerScheduler {
    type Source: TimerSource;

    /// Allocate a source that fires `after` once resumed, then every
    /// `repeating` period (`None` = fire once).
    ///
    /// `leeway` is the slack the platform may add to each deadline to
    /// coalesce wake-ups; implementations without such a knob ignore it.
    ///
    /// The returned source starts **suspended** with no handler installed.
    /// Allocation must be cheap, must not fire anything on its own and must
    /// not wait for a running handler: the timer calls it under its lock.
    fn schedule(
        &self,
        after: Duration,
        repeating: Option<Duration>,
        leeway: Duration,
    ) -> Self::Source;
}

impl<S: TimerScheduler + ?Sized> TimerScheduler for &S {
    type Source = S::Source;

    fn schedule(
        &self,
        after: Duration,
        repeating: Option<Duration>,
        leeway: Duration,
    ) -> Self::Source {
        (**self).schedule(after, repeating, leeway)
    }
}
