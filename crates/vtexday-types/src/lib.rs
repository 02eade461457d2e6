//! Shared types, adapter traits, and core utilities for the VTEX DAY notification service.
//!
//! This crate holds the foundational types shared between the core, push and
//! server crates and the adapter implementations.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod error;
pub mod prelude;
pub mod push_adapter;
pub mod types;

// vim: ts=4
