// Test doubles to drive timers by hand and observe what they do.
use dispatch_timer::{
    platform::traits::{
        scheduler::TimerScheduler,
        source::{FireHandler, TimerSource},
    },
    TimerEvent, TimerHook, TimerId, TimerObserver,
};
use embassy_time::Duration;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
/// One call recorded by the manual scheduler.
pub enum SourceOp {
    Schedule {
        after: Duration,
        repeating: Option<Duration>,
        leeway: Duration,
    },
    SetHandler,
    ClearHandler,
    Resume,
    Suspend,
    Cancel,
}

#[derive(Default)]
struct Journal {
    ops: Vec<SourceOp>,
    handlers: Vec<Option<FireHandler>>,
    suspended: Vec<bool>,
    /// Set when a suspended source is cancelled.
    fault: bool,
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Scheduler that never ticks on its own: tests call [`ManualScheduler::fire`].
pub struct ManualScheduler {
    journal: Arc<Mutex<Journal>>,
}

#[allow(dead_code)]
impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every source call so far, in order.
    pub fn ops(&self) -> Vec<SourceOp> {
        self.journal.lock().unwrap().ops.clone()
    }

    /// Number of sources allocated so far.
    pub fn sources(&self) -> usize {
        self.journal.lock().unwrap().handlers.len()
    }

    /// `true` when a suspended source was cancelled.
    pub fn faulted(&self) -> bool {
        self.journal.lock().unwrap().fault
    }

    /// Tick the latest source, as the platform would. Returns `false` when
    /// no handler is installed. The handler runs outside the journal lock.
    pub fn fire(&self) -> bool {
        let handler = self
            .journal
            .lock()
            .unwrap()
            .handlers
            .last()
            .cloned()
            .flatten();
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// Handler of the latest source, kept alive past detach to simulate a
    /// tick already in flight.
    pub fn captured_handler(&self) -> Option<FireHandler> {
        self.journal
            .lock()
            .unwrap()
            .handlers
            .last()
            .cloned()
            .flatten()
    }
}

impl TimerScheduler for ManualScheduler {
    type Source = ManualSource;

    fn schedule(
        &self,
        after: Duration,
        repeating: Option<Duration>,
        leeway: Duration,
    ) -> Self::Source {
        let mut journal = self.journal.lock().unwrap();
        journal.ops.push(SourceOp::Schedule {
            after,
            repeating,
            leeway,
        });
        journal.handlers.push(None);
        journal.suspended.push(true);
        ManualSource {
            index: journal.handlers.len() - 1,
            journal: self.journal.clone(),
        }
    }
}

/// Source half of [`ManualScheduler`].
pub struct ManualSource {
    index: usize,
    journal: Arc<Mutex<Journal>>,
}

impl TimerSource for ManualSource {
    fn set_handler(&mut self, handler: FireHandler) {
        let mut journal = self.journal.lock().unwrap();
        journal.ops.push(SourceOp::SetHandler);
        journal.handlers[self.index] = Some(handler);
    }

    fn clear_handler(&mut self) {
        let mut journal = self.journal.lock().unwrap();
        journal.ops.push(SourceOp::ClearHandler);
        journal.handlers[self.index] = None;
    }

    fn resume(&mut self) {
        let mut journal = self.journal.lock().unwrap();
        journal.ops.push(SourceOp::Resume);
        journal.suspended[self.index] = false;
    }

    fn suspend(&mut self) {
        let mut journal = self.journal.lock().unwrap();
        journal.ops.push(SourceOp::Suspend);
        journal.suspended[self.index] = true;
    }

    fn cancel(&mut self) {
        let mut journal = self.journal.lock().unwrap();
        journal.ops.push(SourceOp::Cancel);
        if journal.suspended[self.index] {
            journal.fault = true;
        }
        journal.handlers[self.index] = None;
    }
}

#[derive(Default)]
#[allow(dead_code)]
/// Observer counting fires and remembering which timers fired.
pub struct CountingObserver {
    count: AtomicUsize,
    fired: Mutex<Vec<TimerId>>,
}

#[allow(dead_code)]
impl CountingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn fired(&self) -> Vec<TimerId> {
        self.fired.lock().unwrap().clone()
    }
}

impl TimerObserver for CountingObserver {
    fn timer_fired(&self, timer: TimerId) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.fired.lock().unwrap().push(timer);
    }
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Hook keeping every lifecycle event.
pub struct RecordingHook {
    events: Arc<Mutex<Vec<(TimerId, TimerEvent)>>>,
}

#[allow(dead_code)]
impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TimerEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| *event)
            .collect()
    }

    pub fn count(&self, wanted: &TimerEvent) -> usize {
        self.events()
            .iter()
            .filter(|event| *event == wanted)
            .count()
    }
}

impl TimerHook for RecordingHook {
    fn on_event(&self, timer: TimerId, event: &TimerEvent) {
        self.events.lock().unwrap().push((timer, *event));
    }
}
