//! `dispatch-timer` library: a periodic / one-shot timer state machine that
//! wraps a platform timer source behind `resume`/`pause`/`invalidate` and
//! forwards each fire to a single, weakly held observer. The platform side is
//! abstracted by traits so the core stays `no_std`; a tokio-backed scheduler
//! ships behind the `tokio` feature.
#![no_std]
//==================================================================================
extern crate alloc;
#[cfg(any(feature = "std", test))]
extern crate std;
//==================================================================================
/// Data types shared by the timer, its hooks and its observers.
pub mod core;
/// Construction errors.
pub mod error;
/// Platform capability traits and the bundled scheduler implementations.
pub mod platform;
/// The timer state machine, its builder, observer and lifecycle hook.
pub mod timer;
//==================================================================================
pub use crate::core::{TimerEvent, TimerId, TimerState};
pub use crate::error::TimerError;
pub use crate::timer::{hook::TimerHook, observer::TimerObserver, Timer, TimerBuilder};
