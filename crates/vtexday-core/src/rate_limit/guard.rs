//! Throttle Guard
//!
//! Fixed-window admission check. The read-modify-write of a subject's record
//! happens under that record's entry lock, so concurrent calls for the same
//! subject cannot interleave between the check and the increment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};

use super::config::ThrottlePolicy;
use super::error::ThrottleError;
use super::store::{ThrottleRecord, ThrottleStore};
use crate::prelude::*;

/// A granted admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
	/// Quota of the policy that admitted the action
	pub limit: u32,
	/// Admissions left in the current window
	pub remaining: u32,
	/// When the current window resets
	pub reset_at: Timestamp,
}

impl Admission {
	/// Add X-RateLimit-* headers describing the remaining quota
	pub fn apply_headers(&self, headers: &mut HeaderMap) {
		headers.insert("X-RateLimit-Limit", HeaderValue::from(self.limit));
		headers.insert("X-RateLimit-Remaining", HeaderValue::from(self.remaining));
		headers.insert("X-RateLimit-Reset", HeaderValue::from(self.reset_at.as_secs_ceil()));
	}
}

/// Statistics about the throttle
#[derive(Debug, Clone, Default)]
pub struct ThrottleStats {
	/// Subjects currently holding a record
	pub tracked_subjects: usize,
	/// Actions admitted since start
	pub total_admitted: u64,
	/// Actions rejected since start
	pub total_rejected: u64,
}

pub struct ThrottleGuard {
	store: Arc<ThrottleStore>,
	total_admitted: AtomicU64,
	total_rejected: AtomicU64,
}

impl ThrottleGuard {
	pub fn new(store: Arc<ThrottleStore>) -> Self {
		Self { store, total_admitted: AtomicU64::new(0), total_rejected: AtomicU64::new(0) }
	}

	pub fn store(&self) -> &Arc<ThrottleStore> {
		&self.store
	}

	/// Decide whether `subject` may act at `now` under `policy`, recording the
	/// admission if so.
	pub fn check_and_record(
		&self,
		subject: Option<&str>,
		policy: &ThrottlePolicy,
		now: Timestamp,
	) -> Result<Admission, ThrottleError> {
		let Some(subject) = subject.filter(|s| !s.is_empty()) else {
			warn!("Throttled action attempted without a subject");
			return Err(ThrottleError::MissingSubjectIdentifier);
		};
		let window_ms = policy.window_ms.get();

		let result = self.store.with_record(
			subject,
			|| ThrottleRecord::fresh(now, window_ms),
			|record| {
				if record.window_elapsed(now) {
					*record = ThrottleRecord::fresh(now, window_ms);
				}

				if record.count >= policy.max_actions {
					let retry_after_secs = now.millis_until(record.reset_at).div_ceil(1000);
					return Err(ThrottleError::RateLimitExceeded { retry_after_secs });
				}

				record.count += 1;
				Ok(Admission {
					limit: policy.max_actions,
					remaining: policy.max_actions - record.count,
					reset_at: record.reset_at,
				})
			},
		);

		match &result {
			Ok(_) => {
				self.total_admitted.fetch_add(1, Ordering::Relaxed);
			}
			Err(e) => {
				self.total_rejected.fetch_add(1, Ordering::Relaxed);
				debug!(subject = %subject, "Throttled: {}", e);
			}
		}
		result
	}

	pub fn stats(&self) -> ThrottleStats {
		ThrottleStats {
			tracked_subjects: self.store.len(),
			total_admitted: self.total_admitted.load(Ordering::Relaxed),
			total_rejected: self.total_rejected.load(Ordering::Relaxed),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn guard() -> ThrottleGuard {
		ThrottleGuard::new(Arc::new(ThrottleStore::new()))
	}

	fn policy(window_ms: u64, max_actions: u32) -> ThrottlePolicy {
		ThrottlePolicy::new(window_ms, max_actions).unwrap()
	}

	#[test]
	fn test_quota_enforcement() {
		for max in 0..5u32 {
			let guard = guard();
			let policy = policy(60_000, max);
			for call in 0..(max + 4) {
				let result = guard.check_and_record(Some("user:1"), &policy, Timestamp(i64::from(call)));
				if call < max {
					assert!(result.is_ok(), "call {} of max {} should be admitted", call, max);
				} else {
					assert!(matches!(result, Err(ThrottleError::RateLimitExceeded { .. })));
				}
			}
		}
	}

	#[test]
	fn test_scenario_three_per_minute() {
		let guard = guard();
		let policy = policy(60_000, 3);

		assert!(guard.check_and_record(Some("user-1"), &policy, Timestamp(0)).is_ok());
		assert!(guard.check_and_record(Some("user-1"), &policy, Timestamp(10)).is_ok());
		assert!(guard.check_and_record(Some("user-1"), &policy, Timestamp(20)).is_ok());
		assert_eq!(
			guard.check_and_record(Some("user-1"), &policy, Timestamp(30)),
			Err(ThrottleError::RateLimitExceeded { retry_after_secs: 60 })
		);

		let admission = guard.check_and_record(Some("user-1"), &policy, Timestamp(60_000)).unwrap();
		assert_eq!(admission.remaining, 2);
		assert_eq!(admission.reset_at, Timestamp(120_000));
	}

	#[test]
	fn test_window_reset_at_boundary() {
		let guard = guard();
		let policy = policy(1_000, 1);

		assert!(guard.check_and_record(Some("user:1"), &policy, Timestamp(0)).is_ok());
		assert!(guard.check_and_record(Some("user:1"), &policy, Timestamp(999)).is_err());

		// now == reset_at opens a new window
		assert!(guard.check_and_record(Some("user:1"), &policy, Timestamp(1_000)).is_ok());
		let record = guard.store().get("user:1").unwrap();
		assert_eq!(record.count, 1);
		assert_eq!(record.reset_at, Timestamp(2_000));
	}

	#[test]
	fn test_retry_after_rounds_up() {
		let guard = guard();
		let policy = policy(1_500, 1);

		guard.check_and_record(Some("user:1"), &policy, Timestamp(0)).unwrap();
		assert_eq!(
			guard.check_and_record(Some("user:1"), &policy, Timestamp(1_499)),
			Err(ThrottleError::RateLimitExceeded { retry_after_secs: 1 })
		);
		assert_eq!(
			guard.check_and_record(Some("user:1"), &policy, Timestamp(1)),
			Err(ThrottleError::RateLimitExceeded { retry_after_secs: 2 })
		);
	}

	#[test]
	fn test_reset_header_not_before_window_end() {
		let guard = guard();
		let policy = policy(1_500, 2);

		let admission = guard.check_and_record(Some("user:1"), &policy, Timestamp(0)).unwrap();
		let mut headers = HeaderMap::new();
		admission.apply_headers(&mut headers);
		assert_eq!(headers.get("X-RateLimit-Reset").unwrap(), "2");
		assert_eq!(headers.get("X-RateLimit-Remaining").unwrap(), "1");
	}

	#[test]
	fn test_subjects_are_independent() {
		let guard = guard();
		let policy = policy(60_000, 2);

		for t in 0..5 {
			let _ = guard.check_and_record(Some("user:a"), &policy, Timestamp(t));
		}
		assert!(guard.check_and_record(Some("user:a"), &policy, Timestamp(5)).is_err());

		let admission = guard.check_and_record(Some("user:b"), &policy, Timestamp(5)).unwrap();
		assert_eq!(admission.remaining, 1);
	}

	#[test]
	fn test_zero_quota_rejects_first_call() {
		let guard = guard();
		let policy = policy(60_000, 0);

		assert_eq!(
			guard.check_and_record(Some("user:1"), &policy, Timestamp(0)),
			Err(ThrottleError::RateLimitExceeded { retry_after_secs: 60 })
		);
		assert!(guard.check_and_record(Some("user:1"), &policy, Timestamp(120_000)).is_err());
	}

	#[test]
	fn test_missing_subject() {
		let guard = guard();
		let policy = policy(60_000, 10);

		assert_eq!(
			guard.check_and_record(None, &policy, Timestamp(0)),
			Err(ThrottleError::MissingSubjectIdentifier)
		);
		assert_eq!(
			guard.check_and_record(Some(""), &policy, Timestamp(0)),
			Err(ThrottleError::MissingSubjectIdentifier)
		);
		assert!(guard.store().is_empty());
	}

	#[test]
	fn test_huge_window() {
		let guard = guard();
		let policy = policy(u64::MAX, 1);

		let admission = guard.check_and_record(Some("user:1"), &policy, Timestamp(1_000)).unwrap();
		assert_eq!(admission.reset_at, Timestamp(i64::MAX));
		assert!(guard.check_and_record(Some("user:1"), &policy, Timestamp(2_000)).is_err());
	}

	#[test]
	fn test_stats() {
		let guard = guard();
		let policy = policy(60_000, 1);

		guard.check_and_record(Some("user:1"), &policy, Timestamp(0)).unwrap();
		let _ = guard.check_and_record(Some("user:1"), &policy, Timestamp(1));
		guard.check_and_record(Some("user:2"), &policy, Timestamp(1)).unwrap();

		let stats = guard.stats();
		assert_eq!(stats.tracked_subjects, 2);
		assert_eq!(stats.total_admitted, 2);
		assert_eq!(stats.total_rejected, 1);
	}

	#[test]
	fn test_concurrent_admissions_respect_quota() {
		let guard = Arc::new(guard());
		let policy = policy(60_000, 50);

		let handles: Vec<_> = (0..8)
			.map(|_| {
				let guard = guard.clone();
				std::thread::spawn(move || {
					(0..20)
						.filter(|_| {
							guard.check_and_record(Some("user:1"), &policy, Timestamp(0)).is_ok()
						})
						.count()
				})
			})
			.collect();

		let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
		assert_eq!(admitted, 50);
		assert_eq!(guard.store().get("user:1").unwrap().count, 50);
	}
}

// vim: ts=4
