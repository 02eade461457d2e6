//! Background reaper evicting expired throttle records

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::store::ThrottleStore;
use crate::prelude::*;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone)]
pub struct ThrottleReaper {
	store: Arc<ThrottleStore>,
}

impl ThrottleReaper {
	pub fn new(store: Arc<ThrottleStore>) -> Self {
		Self { store }
	}

	/// Remove every record whose window ended before `now`.
	///
	/// Records with `reset_at >= now` are left alone. Returns the number removed.
	pub fn sweep(&self, now: Timestamp) -> usize {
		self.store.retain(|_, record| record.reset_at >= now)
	}

	/// Sweep every `interval` on a background task until the handle is cancelled
	pub fn spawn(self, interval: Duration) -> ReaperHandle {
		let interval = interval.max(MIN_SWEEP_INTERVAL);
		let cancel = CancellationToken::new();
		let token = cancel.clone();

		let task = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
			// First tick completes immediately
			ticker.tick().await;

			info!(interval = ?interval, "Throttle reaper started");
			loop {
				tokio::select! {
					() = token.cancelled() => {
						info!("Throttle reaper stopped");
						break;
					}
					_ = ticker.tick() => {
						let removed = self.sweep(Timestamp::now());
						debug!(removed, remaining = self.store.len(), "Throttle sweep");
					}
				}
			}
		});

		ReaperHandle { cancel, task: Some(task) }
	}
}

/// Handle to a running reaper. Dropping it stops the task.
pub struct ReaperHandle {
	cancel: CancellationToken,
	task: Option<JoinHandle<()>>,
}

impl ReaperHandle {
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Cancel and wait for the task to finish
	pub async fn shutdown(mut self) {
		self.cancel.cancel();
		if let Some(task) = self.task.take()
			&& let Err(e) = task.await
		{
			warn!(error = %e, "Throttle reaper task failed");
		}
	}
}

impl Drop for ReaperHandle {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rate_limit::store::ThrottleRecord;

	fn record(reset_at: i64) -> ThrottleRecord {
		ThrottleRecord { count: 1, reset_at: Timestamp(reset_at) }
	}

	#[test]
	fn test_sweep_removes_only_expired() {
		let store = Arc::new(ThrottleStore::new());
		store.set("old", record(999));
		store.set("edge", record(1_000));
		store.set("live", record(5_000));

		let reaper = ThrottleReaper::new(store.clone());
		assert_eq!(reaper.sweep(Timestamp(1_000)), 1);

		assert!(store.get("old").is_none());
		assert_eq!(store.get("edge"), Some(record(1_000)));
		assert_eq!(store.get("live"), Some(record(5_000)));
	}

	#[test]
	fn test_sweep_empty_store() {
		let reaper = ThrottleReaper::new(Arc::new(ThrottleStore::new()));
		assert_eq!(reaper.sweep(Timestamp(0)), 0);
	}

	#[tokio::test]
	async fn test_spawned_reaper_sweeps_and_stops() {
		let store = Arc::new(ThrottleStore::new());
		store.set("expired", record(0));

		let handle = ThrottleReaper::new(store.clone()).spawn(Duration::from_millis(10));
		for _ in 0..100 {
			if store.is_empty() {
				break;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		assert!(store.is_empty());

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn test_drop_cancels() {
		let handle = ThrottleReaper::new(Arc::new(ThrottleStore::new())).spawn(Duration::ZERO);
		let token = handle.cancel.clone();
		assert!(!handle.is_cancelled());
		drop(handle);
		assert!(token.is_cancelled());
	}
}

// vim: ts=4
