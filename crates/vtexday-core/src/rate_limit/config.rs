//! Throttle Configuration
//!
//! Fixed-window policies supplied by the code that protects an action,
//! plus the sweep interval of the background reaper.

use std::num::NonZeroU64;
use std::time::Duration;

use crate::prelude::*;

/// Admission policy for one protected action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottlePolicy {
	/// Length of each throttling window
	pub window_ms: NonZeroU64,
	/// Admissions allowed per window. Zero rejects everything.
	pub max_actions: u32,
}

impl ThrottlePolicy {
	pub fn new(window_ms: u64, max_actions: u32) -> ClResult<Self> {
		let window_ms = NonZeroU64::new(window_ms).ok_or_else(|| {
			Error::ConfigError("throttle window must be longer than 0 ms".to_string())
		})?;
		Ok(Self { window_ms, max_actions })
	}

	pub fn window(&self) -> Duration {
		Duration::from_millis(self.window_ms.get())
	}
}

impl Default for ThrottlePolicy {
	fn default() -> Self {
		// 60 000 is non-zero
		const ONE_MINUTE_MS: NonZeroU64 = match NonZeroU64::new(60_000) {
			Some(v) => v,
			None => unreachable!(),
		};
		// 5 notifications per minute
		Self { window_ms: ONE_MINUTE_MS, max_actions: 5 }
	}
}

/// Throttle subsystem configuration
#[derive(Clone, Debug)]
pub struct ThrottleConfig {
	/// Policy guarding notification sends
	pub notify: ThrottlePolicy,
	/// How often expired records are swept
	pub sweep_interval: Duration,
}

impl Default for ThrottleConfig {
	fn default() -> Self {
		Self { notify: ThrottlePolicy::default(), sweep_interval: Duration::from_secs(300) }
	}
}


// vim: ts=4
