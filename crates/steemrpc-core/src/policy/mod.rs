//! Reliability policy shared by the connect and call phases.
//!
//! ```text
//! attempt → [Interrupt check] → Session → failure? → [RetryPolicy delay] → next endpoint
//! ```

pub mod interrupt;
pub mod retry;

pub use interrupt::Interrupt;
pub use retry::{backoff_units, RetryConfig, RetryPolicy, MAX_BACKOFF_UNITS};
