//! Pure request-lifecycle logic: submission validation with derived
//! durations, the status state machine, the cancellation cycle, and
//! role-based visibility. No I/O here; handlers apply the returned effects
//! as guarded store writes.

pub mod duration;
pub mod engine;
pub mod error;
pub mod visibility;
