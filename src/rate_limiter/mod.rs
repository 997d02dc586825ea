mod asynchronous;
mod blocking;
pub mod registry;
mod window;

pub use asynchronous::AsyncRateLimiter;
pub use blocking::RateLimiter;
pub use window::{Decision, SlidingWindow};
