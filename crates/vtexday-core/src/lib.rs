//! Core infrastructure for the VTEX DAY notification service.
//!
//! Per-user throttling, bearer token authentication, request extractors and
//! the shared application state used by the push and server crates.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod extensions;
pub mod extract;
pub mod middleware;
pub mod prelude;
pub mod rate_limit;
pub mod token;

pub use app::{App, AppBuilderOpts, AppState};
pub use extract::{Admin, Auth};

// vim: ts=4
