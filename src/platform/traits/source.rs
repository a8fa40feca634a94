//! Handle side of the platform timer capability: one scheduled source that
//! delivers ticks to an installed handler.
use alloc::sync::Arc;

/// Callback invoked by a source on every tick, on whatever execution context
/// the platform chooses.
pub type FireHandler = Arc<dyn Fn() + Send + Sync>;

/// A scheduled platform timer; must remain thread-safe since ticks are
/// delivered off the owner's context.
///
/// # Contract
///
/// - Fires for a single source are serialized: the handler is never running
///   twice at the same time.
/// - `suspend()` and `resume()` calls are balanced by the caller.
/// - `cancel()` must only be called on a **resumed** source. Some platforms
///   fault when a suspended source is cancelled; callers resume first.
/// - After `clear_handler()` or `cancel()` returns, no tick that has not yet
///   reached the handler may reach it.
/// - After `suspend()` returns, no tick reaches the handler until the next
///   `resume()`, even when its deadline had already elapsed.
/// - `set_handler()`, `resume()` and `suspend()` may be called while the
///   owning timer holds its lock: they must not wait for a running handler.
///   `clear_handler()` and `cancel()` are called without that lock.
pub trait TimerSource: Send {
    /// Install (or replace) the tick handler.
    fn set_handler(&mut self, handler: FireHandler);

    /// Detach the tick handler. The source keeps ticking into the void.
    fn clear_handler(&mut self);

    /// Start, or restart, tick delivery.
    fn resume(&mut self);

    /// Halt tick delivery until the next `resume()`.
    fn suspend(&mut self);

    /// Stop the source for good and release its platform resources.
    fn cancel(&mut self);
}
