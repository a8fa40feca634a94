//! Error definitions. Runtime operations on a timer never fail (they degrade
//! to no-ops); only construction validates its input.
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised while building a [`Timer`](crate::timer::Timer).
pub enum TimerError {
    /// A zero interval is reserved as the "cleared" sentinel and would make
    /// the platform source spin.
    #[error("Timer interval must be greater than zero")]
    ZeroInterval,
}
