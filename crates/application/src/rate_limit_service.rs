//! Rate limiting ports and application service.
//!
//! Implements a bucketed time-window rate limiter: every throttled action is
//! a named event, and each (subject identifier, event, window) triple maps to
//! one integer counter in the counter store. Windows are 20-minute UTC
//! buckets; counters expire with the window and never carry over. Exceeding a
//! configured event limit raises `AppError::RateLimited` after the increment
//! has been durably applied.

mod config;
mod limiter;
mod ports;
mod service;
mod window;

#[cfg(test)]
mod tests;

pub use config::{DEFAULT_EVENT_LIMIT, RateLimitEvents};
pub use limiter::Limiter;
pub use ports::CounterStore;
pub use service::{RateLimitService, RateLimited};
pub use window::{WINDOW_SECONDS, window_stamp};
