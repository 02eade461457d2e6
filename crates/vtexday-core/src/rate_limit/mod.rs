//! Per-user Throttling
//!
//! Fixed-window, in-memory, single-process limiter guarding expensive actions
//! such as broadcasting push notifications. Records live in a concurrent map
//! and are evicted by a background reaper once their window is over.

mod config;
mod error;
mod guard;
mod middleware;
mod reaper;
mod store;

pub use config::{ThrottleConfig, ThrottlePolicy};
pub use error::ThrottleError;
pub use guard::{Admission, ThrottleGuard, ThrottleStats};
pub use middleware::{ThrottleLayer, ThrottleService};
pub use reaper::{ReaperHandle, ThrottleReaper};
pub use store::{ThrottleRecord, ThrottleStore};

// vim: ts=4
