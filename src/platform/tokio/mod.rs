//! [`TimerScheduler`] backed by a tokio runtime: each source is one spawned
//! task that sleeps towards its next deadline and calls the installed handler
//! from the runtime's worker.
//!
//! # Timing model
//!
//! - The first tick lands `after` past the `resume()` that started the source.
//! - Later ticks follow a fixed grid of `repeating` periods, so handler run
//!   time does not make the timer drift.
//! - `suspend()` drops the grid. The next `resume()` re-arms a full period;
//!   ticks missed while suspended are not replayed, including a deadline that
//!   elapsed just before the suspend was observed.
//! - A one-shot source ticks once per resume; after a suspend/resume cycle it
//!   is armed again.
//! - Tokio's timer wheel has no slack parameter: `leeway` is kept on the
//!   source for inspection and otherwise ignored.
use core::cell::RefCell;
use core::time::Duration as StdDuration;

use alloc::sync::Arc;
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::Duration;
use futures_util::{
    future::{select, Either},
    pin_mut,
};
use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{sleep_until, Instant},
};

use crate::platform::traits::{
    scheduler::TimerScheduler,
    source::{FireHandler, TimerSource},
};

/// Handler slot shared between a source and its task.
type HandlerSlot = Mutex<CriticalSectionRawMutex, RefCell<Option<FireHandler>>>;

//==================================================================================SCHEDULER
/// Spawns one task per source on the wrapped runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Wrap an explicit runtime handle.
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler on the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics outside of a tokio runtime, like [`Handle::current`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Non-panicking variant of [`current`](Self::current).
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl TimerScheduler for TokioScheduler {
    type Source = TokioSource;

    fn schedule(
        &self,
        after: Duration,
        repeating: Option<Duration>,
        leeway: Duration,
    ) -> Self::Source {
        let (running, running_rx) = watch::channel(false);
        let handler: Arc<HandlerSlot> = Arc::new(Mutex::new(RefCell::new(None)));
        let task = self.runtime.spawn(drive(
            running_rx,
            handler.clone(),
            to_std(after),
            repeating.map(to_std),
        ));

        TokioSource {
            running,
            handler,
            task,
            leeway,
            suspended: true,
            cancelled: false,
        }
    }
}

//==================================================================================SOURCE
/// Source handle returned by [`TokioScheduler`]. Dropping it cancels the task.
pub struct TokioSource {
    running: watch::Sender<bool>,
    handler: Arc<HandlerSlot>,
    task: JoinHandle<()>,
    leeway: Duration,
    suspended: bool,
    cancelled: bool,
}

impl TokioSource {
    /// Leeway requested at scheduling time.
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl core::fmt::Debug for TokioSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokioSource")
            .field("leeway", &self.leeway)
            .field("suspended", &self.suspended)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

impl TimerSource for TokioSource {
    fn set_handler(&mut self, handler: FireHandler) {
        self.handler.lock(|slot| *slot.borrow_mut() = Some(handler));
    }

    fn clear_handler(&mut self) {
        self.handler.lock(|slot| *slot.borrow_mut() = None);
    }

    fn resume(&mut self) {
        if self.cancelled {
            return;
        }
        self.suspended = false;
        self.running.send_replace(true);
    }

    fn suspend(&mut self) {
        if self.cancelled {
            return;
        }
        self.suspended = true;
        self.running.send_replace(false);
    }

    fn cancel(&mut self) {
        debug_assert!(!self.suspended, "cancelling a suspended timer source");
        self.clear_handler();
        self.task.abort();
        self.cancelled = true;
    }
}

impl Drop for TokioSource {
    fn drop(&mut self) {
        if !self.cancelled {
            self.clear_handler();
            self.task.abort();
        }
    }
}

//==================================================================================TASK
/// Source task: waits for the running flag, then ticks until suspended.
async fn drive(
    mut running: watch::Receiver<bool>,
    handler: Arc<HandlerSlot>,
    after: StdDuration,
    repeating: Option<StdDuration>,
) {
    let mut period = after;

    loop {
        // Step 1: park until resumed. A dropped sender means the source is gone.
        while !*running.borrow_and_update() {
            if running.changed().await.is_err() {
                return;
            }
        }

        // Step 2: tick on a fixed grid anchored at the resume instant.
        let mut deadline = Instant::now() + period;
        'ticking: loop {
            let wake = {
                let tick = sleep_until(deadline);
                let state_change = running.changed();
                pin_mut!(tick);
                pin_mut!(state_change);

                match select(tick, state_change).await {
                    Either::Left(_) => Wake::Tick,
                    Either::Right((Ok(()), _)) => Wake::StateChanged,
                    Either::Right((Err(_), _)) => Wake::SourceDropped,
                }
            };

            match wake {
                Wake::Tick => {
                    // Deadline reached while a suspend was pending: not a tick.
                    // Park with `period` untouched so the next resume re-arms it.
                    if !*running.borrow() {
                        break 'ticking;
                    }
                    // Clone out of the slot: the handler may cancel this source.
                    let current = handler.lock(|slot| slot.borrow().clone());
                    if let Some(fire) = current {
                        fire();
                    }
                    match repeating {
                        Some(every) => {
                            period = every;
                            deadline += every;
                        }
                        None => {
                            // Spent until a suspend/resume cycle re-arms it. Any
                            // change implies a suspend, even if already resumed.
                            if running.changed().await.is_err() {
                                return;
                            }
                            break 'ticking;
                        }
                    }
                }
                Wake::StateChanged => {
                    if !*running.borrow_and_update() {
                        break 'ticking;
                    }
                }
                Wake::SourceDropped => return,
            }
        }
    }
}

/// Why the source task woke up.
enum Wake {
    Tick,
    StateChanged,
    SourceDropped,
}

fn to_std(duration: Duration) -> StdDuration {
    StdDuration::from_micros(duration.as_micros())
}
