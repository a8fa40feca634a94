//! Platform side of the timer: the capability traits a scheduler must
//! provide, and the implementations bundled with the crate.
//!
//! The core never talks to an OS or an executor directly. It asks a
//! [`TimerScheduler`](traits::scheduler::TimerScheduler) for a
//! [`TimerSource`](traits::source::TimerSource) on first resume and drives
//! that source for the rest of its life.

pub mod traits;

#[cfg(feature = "tokio")]
pub mod tokio;
