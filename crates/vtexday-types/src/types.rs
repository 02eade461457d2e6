//! Common types used throughout the service.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

// Timestamp //
//***********//
/// Unix timestamp in milliseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(i64::try_from(res.as_millis()).unwrap_or(i64::MAX))
	}

	/// Timestamp `ms` milliseconds later, saturating at the far end
	pub fn add_ms(self, ms: u64) -> Timestamp {
		Timestamp(self.0.saturating_add(i64::try_from(ms).unwrap_or(i64::MAX)))
	}

	/// Milliseconds from `self` until `later`, zero if `later` is not in the future
	pub fn millis_until(self, later: Timestamp) -> u64 {
		u64::try_from(later.0.saturating_sub(self.0)).unwrap_or(0)
	}

	/// Whole seconds since the epoch
	pub fn as_secs(self) -> i64 {
		self.0.div_euclid(1000)
	}

	/// Whole seconds since the epoch, rounded up
	pub fn as_secs_ceil(self) -> i64 {
		self.as_secs() + i64::from(self.0.rem_euclid(1000) != 0)
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_add_ms_saturates() {
		assert_eq!(Timestamp(1_000).add_ms(500), Timestamp(1_500));
		assert_eq!(Timestamp(i64::MAX - 1).add_ms(u64::MAX), Timestamp(i64::MAX));
	}

	#[test]
	fn test_millis_until() {
		assert_eq!(Timestamp(30).millis_until(Timestamp(60_000)), 59_970);
		assert_eq!(Timestamp(60_000).millis_until(Timestamp(30)), 0);
	}

	#[test]
	fn test_as_secs() {
		assert_eq!(Timestamp(61_999).as_secs(), 61);
		assert_eq!(Timestamp(61_001).as_secs_ceil(), 62);
		assert_eq!(Timestamp(61_000).as_secs_ceil(), 61);
		assert_eq!(Timestamp(i64::MAX).as_secs_ceil(), i64::MAX / 1000 + 1);
	}
}

// vim: ts=4
