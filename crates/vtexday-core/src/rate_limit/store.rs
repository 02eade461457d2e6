//! Throttle record store
//!
//! Process-local map from subject identifier to its current window. Records
//! are never persisted: a restart gives every subject a fresh quota.

use dashmap::DashMap;

use crate::prelude::*;

/// Rate limiting state of one subject within its current window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleRecord {
	/// Actions admitted since the window opened
	pub count: u32,
	/// When the window expires and the count starts over
	pub reset_at: Timestamp,
}

impl ThrottleRecord {
	/// Empty record for a window opening at `now`
	pub fn fresh(now: Timestamp, window_ms: u64) -> Self {
		Self { count: 0, reset_at: now.add_ms(window_ms) }
	}

	/// The window is over once `now` reaches `reset_at`
	pub fn window_elapsed(&self, now: Timestamp) -> bool {
		now >= self.reset_at
	}
}

/// In-memory store exclusively owning all throttle records
#[derive(Debug, Default)]
pub struct ThrottleStore {
	records: DashMap<Box<str>, ThrottleRecord>,
}

impl ThrottleStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, subject: &str) -> Option<ThrottleRecord> {
		self.records.get(subject).map(|r| *r)
	}

	/// Insert or replace unconditionally
	pub fn set(&self, subject: &str, record: ThrottleRecord) {
		self.records.insert(subject.into(), record);
	}

	pub fn delete(&self, subject: &str) -> Option<ThrottleRecord> {
		self.records.remove(subject).map(|(_, record)| record)
	}

	pub fn for_each(&self, mut f: impl FnMut(&str, &ThrottleRecord)) {
		for entry in &self.records {
			f(entry.key().as_ref(), entry.value());
		}
	}

	/// Keep only records matching the predicate. Returns how many were removed.
	pub fn retain(&self, mut keep: impl FnMut(&str, &ThrottleRecord) -> bool) -> usize {
		let mut removed = 0;
		self.records.retain(|subject, record| {
			let kept = keep(subject.as_ref(), record);
			if !kept {
				removed += 1;
			}
			kept
		});
		removed
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Run `f` on the subject's record while holding its entry lock.
	///
	/// The record is created with `init` if missing. `f` must not touch the
	/// store again.
	pub(crate) fn with_record<R>(
		&self,
		subject: &str,
		init: impl FnOnce() -> ThrottleRecord,
		f: impl FnOnce(&mut ThrottleRecord) -> R,
	) -> R {
		let mut entry = self.records.entry(subject.into()).or_insert_with(init);
		f(entry.value_mut())
	}
}


// vim: ts=4
