//! Push notification module
//!
//! Broadcasts admin-authored notifications to every registered mobile device
//! through the Expo push service.
//!
//! # Features
//!
//! - Device registration with tokens encrypted at rest (AES-256-GCM)
//! - Plain-text sanitizing of notification title and body
//! - Chunked delivery with cleanup of devices the push service reports gone

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod crypto;
pub mod handler;
pub mod sanitize;
pub mod send;

mod prelude;

pub use crypto::{fingerprint, DeviceTokenCipher};
pub use sanitize::NotificationContent;
pub use send::{send_to_all, DeliveryReport, ExpoPushSender, PushMessage, PushResult, PushSender};

// vim: ts=4
