//! Periodic / one-shot timer built on top of a platform
//! [`TimerSource`](crate::platform::traits::source::TimerSource).
//!
//! A [`Timer`] is configured up front (interval, leeway, fire-once flag,
//! observer) and does not touch the scheduler until its first
//! [`resume`](Timer::resume). From then on it owns exactly one source, reused
//! across every `pause()`/`resume()` cycle, until
//! [`invalidate`](Timer::invalidate) (or `Drop`) cancels it and clears the
//! configuration.
//!
//! Every operation is defined in every state; calls that make no sense in the
//! current state are no-ops, so callers never need to check the state first.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dispatch_timer::{platform::tokio::TokioScheduler, TimerBuilder, TimerId};
//! use embassy_time::Duration;
//!
//! let observer = Arc::new(|timer: TimerId| println!("{timer} fired"));
//!
//! let mut timer = TimerBuilder::new(Duration::from_secs(1))
//!     .with_observer(&observer)
//!     .build(TokioScheduler::current())?;
//! timer.resume();
//! ```
pub mod hook;
pub mod observer;

use alloc::sync::{Arc, Weak};
use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::Duration;

use crate::{
    core::{TimerEvent, TimerId, TimerState},
    error::TimerError,
    platform::traits::{scheduler::TimerScheduler, source::TimerSource},
    timer::{hook::TimerHook, observer::TimerObserver},
};

/// Interval/leeway value of a cleared timer.
const CLEARED: Duration = Duration::from_ticks(0);

//==================================================================================TIMER
/// Timer state machine delivering fires to a single, weakly held observer.
///
/// `resume`, `pause`, `invalidate` and observer assignment take `&mut self`:
/// they are meant to be driven from one coordinating context. Fires arrive
/// concurrently on the scheduler's context and are synchronized internally.
pub struct Timer<S: TimerScheduler> {
    /// Factory for the platform source, used on the first resume only.
    scheduler: S,
    /// State shared with the fire handler installed on the source.
    shared: Arc<Shared<S::Source>>,
}

impl<S: TimerScheduler> Timer<S> {
    /// Repeating timer with no leeway, no observer and no hook.
    pub fn new(scheduler: S, interval: Duration) -> Result<Self, TimerError>
    where
        S::Source: 'static,
    {
        TimerBuilder::new(interval).build(scheduler)
    }

    /// Halt fire delivery. Only meaningful while running.
    pub fn pause(&mut self) {
        let paused = self.shared.core.lock(|cell| {
            let mut core = cell.borrow_mut();
            if !core.state.is_running() {
                return false;
            }
            if let Some(handle) = core.handle.as_mut() {
                handle.suspend();
            }
            core.state = TimerState::Suspended;
            true
        });

        if paused {
            #[cfg(feature = "defmt")]
            defmt::debug!("{}: paused", self.id());
            self.shared.emit(TimerEvent::Paused);
        }
    }

    /// Cancel the source, drop the observer and clear the configuration.
    ///
    /// Idempotent. A never-started timer is left untouched.
    pub fn invalidate(&mut self) {
        self.shared.invalidate(None);
    }

    /// Replace the observer. Assigning the observer already held is a no-op;
    /// `None` detaches without touching the run state.
    pub fn set_observer(&mut self, observer: Option<Weak<dyn TimerObserver>>) {
        let changed = self.shared.core.lock(|cell| {
            let mut core = cell.borrow_mut();
            let same = match (&core.observer, &observer) {
                (None, None) => true,
                (Some(current), Some(new)) => Weak::ptr_eq(current, new),
                _ => false,
            };
            if same {
                return None;
            }
            core.observer = observer;
            Some(core.observer.is_some())
        });

        if let Some(attached) = changed {
            #[cfg(feature = "defmt")]
            defmt::debug!("{}: observer attached={}", self.id(), attached);
            self.shared.emit(TimerEvent::ObserverChanged { attached });
        }
    }

    /// Attach `observer` without taking ownership of it.
    pub fn attach<O: TimerObserver + 'static>(&mut self, observer: &Arc<O>) {
        let weak: Weak<O> = Arc::downgrade(observer);
        let weak: Weak<dyn TimerObserver> = weak;
        self.set_observer(Some(weak));
    }

    /// Detach the current observer, if any.
    pub fn detach(&mut self) {
        self.set_observer(None);
    }

    /// The current observer, if one is attached and still alive.
    pub fn observer(&self) -> Option<Arc<dyn TimerObserver>> {
        self.shared
            .core
            .lock(|cell| cell.borrow().observer.as_ref().and_then(Weak::upgrade))
    }

    /// Identity passed to observers and hooks.
    pub fn id(&self) -> TimerId {
        self.shared.id()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TimerState {
        self.shared.core.lock(|cell| cell.borrow().state)
    }

    /// `true` before the first resume and after invalidation.
    pub fn is_invalid(&self) -> bool {
        self.state().is_invalid()
    }

    /// `true` while ticks are delivered.
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// `true` while paused with a source kept around.
    pub fn is_suspended(&self) -> bool {
        self.state().is_suspended()
    }

    /// `true` for a one-shot timer; cleared by invalidation.
    pub fn is_fire_once(&self) -> bool {
        self.shared.core.lock(|cell| cell.borrow().fire_once)
    }

    /// Configured interval; zero once invalidated.
    pub fn interval(&self) -> Duration {
        self.shared.core.lock(|cell| cell.borrow().interval)
    }

    /// Configured leeway; zero once invalidated.
    pub fn leeway(&self) -> Duration {
        self.shared.core.lock(|cell| cell.borrow().leeway)
    }

    /// `true` while a platform source is allocated.
    pub fn has_source(&self) -> bool {
        self.shared.core.lock(|cell| cell.borrow().handle.is_some())
    }
}

impl<S> Timer<S>
where
    S: TimerScheduler,
    S::Source: 'static,
{
    /// Start or restart fire delivery.
    ///
    /// The platform source is allocated on the first resume after
    /// construction and reused by every later resume. No-op while running,
    /// and rejected once `invalidate()` has cleared the interval.
    pub fn resume(&mut self) {
        let weak = Arc::downgrade(&self.shared);
        let scheduler = &self.scheduler;

        let outcome = self.shared.core.lock(|cell| {
            let mut core = cell.borrow_mut();
            if core.state.is_running() {
                return ResumeOutcome::AlreadyRunning;
            }
            if core.interval == CLEARED {
                return ResumeOutcome::Rejected;
            }

            let created_source = core.handle.is_none();
            if created_source {
                let repeating = (!core.fire_once).then_some(core.interval);
                let mut source = scheduler.schedule(core.interval, repeating, core.leeway);

                // Ticks from a source installed before this one must not count.
                core.epoch = core.epoch.wrapping_add(1);
                let epoch = core.epoch;
                source.set_handler(Arc::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.dispatch(epoch);
                    }
                }));
                core.handle = Some(source);
            }

            core.state = TimerState::Running;
            if let Some(handle) = core.handle.as_mut() {
                handle.resume();
            }
            ResumeOutcome::Resumed { created_source }
        });

        match outcome {
            ResumeOutcome::AlreadyRunning => {}
            ResumeOutcome::Rejected => {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: resume rejected, timer was invalidated", self.id());
                self.shared.emit(TimerEvent::ResumeRejected);
            }
            ResumeOutcome::Resumed { created_source } => {
                #[cfg(feature = "defmt")]
                defmt::debug!("{}: resumed (new source: {})", self.id(), created_source);
                self.shared.emit(TimerEvent::Resumed { created_source });
            }
        }
    }
}

impl<S: TimerScheduler> Drop for Timer<S> {
    fn drop(&mut self) {
        self.shared.invalidate(None);
    }
}

impl<S: TimerScheduler> fmt::Debug for Timer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (state, interval, fire_once) = self.shared.core.lock(|cell| {
            let core = cell.borrow();
            (core.state, core.interval, core.fire_once)
        });
        f.debug_struct("Timer")
            .field("id", &self.id())
            .field("state", &state)
            .field("interval", &interval)
            .field("fire_once", &fire_once)
            .finish_non_exhaustive()
    }
}

enum ResumeOutcome {
    AlreadyRunning,
    Rejected,
    Resumed { created_source: bool },
}

//==================================================================================SHARED_STATE
/// State reachable from both the owning [`Timer`] and the fire handler.
struct Shared<H> {
    core: Mutex<CriticalSectionRawMutex, RefCell<Core<H>>>,
    hook: Option<Arc<dyn TimerHook>>,
}

/// Mutable part of the timer, only touched under the critical section.
struct Core<H> {
    state: TimerState,
    interval: Duration,
    leeway: Duration,
    fire_once: bool,
    observer: Option<Weak<dyn TimerObserver>>,
    /// Lazily allocated platform source.
    handle: Option<H>,
    /// Bumped every time a source is allocated; tags its handler.
    epoch: u32,
}

impl<H: TimerSource> Shared<H> {
    fn id(&self) -> TimerId {
        TimerId::from_raw(self as *const Self as *const () as usize)
    }

    fn emit(&self, event: TimerEvent) {
        if let Some(hook) = &self.hook {
            hook.on_event(self.id(), &event);
        }
    }

    /// Fire path, called by the source on its own execution context.
    ///
    /// The observer is upgraded under the lock and called outside of it, so
    /// an `invalidate()` racing with this tick either wins (nothing is
    /// delivered) or loses (this single delivery completes).
    fn dispatch(&self, epoch: u32) {
        let ticket = self.core.lock(|cell| {
            let core = cell.borrow();
            if core.epoch != epoch || !core.state.is_running() {
                return None;
            }
            let observer = core.observer.as_ref().and_then(Weak::upgrade);
            Some((observer, core.fire_once))
        });
        let Some((observer, fire_once)) = ticket else {
            return;
        };

        let delivered = observer.is_some();
        if let Some(observer) = observer {
            observer.timer_fired(self.id());
        }
        self.emit(TimerEvent::Fired { delivered });

        if fire_once {
            self.invalidate(Some(epoch));
        }
    }

    /// Tear down the source and reset the configuration.
    ///
    /// `epoch` restricts the teardown to the source that produced a given
    /// tick; `None` tears down whatever source is installed.
    ///
    /// The source is detached under the lock and driven outside of it, so a
    /// platform `cancel()` that waits for an in-flight tick cannot deadlock
    /// against [`dispatch`](Self::dispatch).
    fn invalidate(&self, epoch: Option<u32>) {
        let detached = self.core.lock(|cell| {
            let mut core = cell.borrow_mut();
            if core.state.is_invalid() || core.handle.is_none() {
                return None;
            }
            if epoch.is_some_and(|epoch| epoch != core.epoch) {
                return None;
            }

            // Observer first: a tick still in flight must find nothing to call.
            core.observer = None;
            let handle = core.handle.take()?;
            let was_suspended = core.state.is_suspended();

            core.interval = CLEARED;
            core.leeway = CLEARED;
            core.fire_once = false;
            core.state = TimerState::Invalid;
            Some((handle, was_suspended))
        });

        if let Some((mut handle, was_suspended)) = detached {
            handle.clear_handler();
            // Cancelling a suspended source faults on some platforms.
            if was_suspended {
                handle.resume();
            }
            handle.cancel();
            drop(handle);
            #[cfg(feature = "defmt")]
            defmt::info!("{}: invalidated", self.id());
            self.emit(TimerEvent::Invalidated);
        }
    }
}

//==================================================================================TIMER_BUILDER
/// Fluent builder collecting a timer's configuration.
pub struct TimerBuilder {
    interval: Duration,
    leeway: Duration,
    fire_once: bool,
    observer: Option<Weak<dyn TimerObserver>>,
    hook: Option<Arc<dyn TimerHook>>,
}

impl TimerBuilder {
    /// Initializes the builder for a repeating timer with no leeway.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            leeway: CLEARED,
            fire_once: false,
            observer: None,
            hook: None,
        }
    }

    /// Scheduling slack handed to the platform source.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Fire exactly once, then invalidate automatically.
    pub fn fire_once(mut self, fire_once: bool) -> Self {
        self.fire_once = fire_once;
        self
    }

    /// Observer held weakly by the timer.
    pub fn with_observer<O: TimerObserver + 'static>(mut self, observer: &Arc<O>) -> Self {
        let weak: Weak<O> = Arc::downgrade(observer);
        let weak: Weak<dyn TimerObserver> = weak;
        self.observer = Some(weak);
        self
    }

    /// Same as [`with_observer`](Self::with_observer) for an already
    /// downgraded reference.
    pub fn with_weak_observer(mut self, observer: Weak<dyn TimerObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Lifecycle hook receiving every [`TimerEvent`].
    pub fn with_hook<K: TimerHook + 'static>(mut self, hook: K) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Builds the timer. The scheduler is stored, not called.
    ///
    /// Returns [`TimerError::ZeroInterval`] for a zero interval, which is
    /// reserved for the cleared state.
    pub fn build<S>(self, scheduler: S) -> Result<Timer<S>, TimerError>
    where
        S: TimerScheduler,
        S::Source: 'static,
    {
        if self.interval == CLEARED {
            return Err(TimerError::ZeroInterval);
        }

        let shared = Arc::new(Shared {
            core: Mutex::new(RefCell::new(Core {
                state: TimerState::Invalid,
                interval: self.interval,
                leeway: self.leeway,
                fire_once: self.fire_once,
                observer: self.observer,
                handle: None,
                epoch: 0,
            })),
            hook: self.hook,
        });

        #[cfg(feature = "defmt")]
        defmt::info!(
            "{}: created (interval={}, leeway={}, once={})",
            shared.id(),
            self.interval,
            self.leeway,
            self.fire_once
        );
        shared.emit(TimerEvent::Created {
            interval: self.interval,
            leeway: self.leeway,
            fire_once: self.fire_once,
        });

        Ok(Timer { scheduler, shared })
    }
}

impl fmt::Debug for TimerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerBuilder")
            .field("interval", &self.interval)
            .field("leeway", &self.leeway)
            .field("fire_once", &self.fire_once)
            .field("observer", &self.observer.is_some())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
