//! Data types shared between the timer state machine, its lifecycle hook and
//! its observers.
//!
//! None of these types own resources; they describe what a timer is doing
//! (`TimerState`), which timer is doing it (`TimerId`), and what just
//! happened to it (`TimerEvent`).
use embassy_time::Duration;

//==================================================================================TIMER_STATE
/// Run state of a [`Timer`](crate::timer::Timer).
///
/// ```text
///              resume()                 pause()
///   Invalid ───────────▶ Running ◀──────────────▶ Suspended
///      ▲                  │  │        resume()        │
///      │   fire (once)    │  │                        │
///      ├──────────────────┘  │ invalidate()           │ invalidate()
///      └─────────────────────┴────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerState {
    /// Never started, or fully torn down by `invalidate()`.
    #[default]
    Invalid,
    /// Source exists but fire delivery is halted.
    Suspended,
    /// Source exists and delivers fires.
    Running,
}

impl TimerState {
    /// `true` for [`TimerState::Invalid`].
    #[inline]
    pub const fn is_invalid(self) -> bool {
        matches!(self, TimerState::Invalid)
    }

    /// `true` for [`TimerState::Running`].
    #[inline]
    pub const fn is_running(self) -> bool {
        matches!(self, TimerState::Running)
    }

    /// `true` for [`TimerState::Suspended`].
    #[inline]
    pub const fn is_suspended(self) -> bool {
        matches!(self, TimerState::Suspended)
    }
}

//==================================================================================TIMER_ID
/// Identity handed to observers and hooks so a single callback registered
/// with several timers can tell them apart.
///
/// Unique among live timers; a value may be reused once its timer is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(usize);

impl TimerId {
    /// Build a `TimerId` from the raw value.
    #[inline]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Return the underlying value.
    #[inline]
    pub const fn raw(&self) -> usize {
        self.0
    }
}

impl ::core::fmt::Display for TimerId {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "timer#{:x}", self.0)
    }
}

//==================================================================================TIMER_EVENT
/// Lifecycle notifications emitted to an injected
/// [`TimerHook`](crate::timer::hook::TimerHook).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerEvent {
    /// The timer was built. The scheduler has not been touched yet.
    Created {
        interval: Duration,
        leeway: Duration,
        fire_once: bool,
    },
    /// Transition to [`TimerState::Running`]. `created_source` is `true` when
    /// this resume allocated the platform source.
    Resumed { created_source: bool },
    /// Transition to [`TimerState::Suspended`].
    Paused,
    /// Transition to [`TimerState::Invalid`]; configuration was cleared.
    Invalidated,
    /// The source ticked. `delivered` is `false` when no live observer was
    /// attached.
    Fired { delivered: bool },
    /// The observer slot changed.
    ObserverChanged { attached: bool },
    /// `resume()` was called after `invalidate()` cleared the interval.
    ResumeRejected,
}
