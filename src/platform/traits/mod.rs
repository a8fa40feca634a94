//! Abstraction traits for the platform timer capability (scheduler and source).
pub mod scheduler;
pub mod source;
