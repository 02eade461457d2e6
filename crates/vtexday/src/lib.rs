//! VTEX DAY notification service
//!
//! Lets event admins broadcast push notifications to the attendee app while
//! keeping each admin within a fixed per-window quota.
//!
//! # Features
//!
//! - Bearer token authentication with user and admin roles
//! - Per-user fixed-window throttling of broadcasts, with quota headers
//! - Device registration with encrypted token storage
//! - Expo push delivery with cleanup of unregistered devices

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types and adapter traits from vtexday-types
pub use vtexday_types::auth;
pub use vtexday_types::error;
pub use vtexday_types::push_adapter;
pub use vtexday_types::types;

pub use vtexday_core::rate_limit;
pub use vtexday_core::token;
pub use vtexday_push as push;

pub mod app;
pub mod prelude;
pub mod routes;

pub use app::AppBuilder;

// vim: ts=4
