//! In-memory push adapter
//!
//! Keeps registered devices and the notification log in concurrent maps.
//! Everything is lost on restart, which suits single-instance deployments
//! where devices re-register on app start. The notification log keeps only
//! the newest entries.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use vtexday::prelude::*;
use vtexday::push_adapter::{
	Device, DeviceData, DeviceId, Notification, NotificationRecord, PushAdapter,
};

/// Notifications kept in the log by default
pub const DEFAULT_NOTIFICATION_LIMIT: u64 = 1000;

#[derive(Debug)]
pub struct PushAdapterMemory {
	devices: DashMap<DeviceId, Device>,
	/// fingerprint -> device id
	fingerprints: DashMap<String, DeviceId>,
	notifications: DashMap<u64, Notification>,
	notification_limit: u64,
	next_device_id: AtomicU64,
	next_notification_id: AtomicU64,
}

impl Default for PushAdapterMemory {
	fn default() -> Self {
		Self::with_notification_limit(DEFAULT_NOTIFICATION_LIMIT)
	}
}

impl PushAdapterMemory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Keep at most `limit` notifications (at least one), evicting the oldest
	pub fn with_notification_limit(limit: u64) -> Self {
		Self {
			devices: DashMap::new(),
			fingerprints: DashMap::new(),
			notifications: DashMap::new(),
			notification_limit: limit.max(1),
			next_device_id: AtomicU64::new(0),
			next_notification_id: AtomicU64::new(0),
		}
	}

	fn new_device(id: DeviceId, user_id: &str, data: &DeviceData) -> Device {
		Device { id, user_id: user_id.into(), data: data.clone(), created_at: Timestamp::now() }
	}

	fn next_id(counter: &AtomicU64) -> u64 {
		counter.fetch_add(1, Ordering::Relaxed) + 1
	}
}

#[async_trait]
impl PushAdapter for PushAdapterMemory {
	async fn register_device(&self, user_id: &str, data: &DeviceData) -> ClResult<DeviceId> {
		if data.fingerprint.is_empty() {
			return Err(Error::ValidationError("device fingerprint is empty".into()));
		}

		// The fingerprint entry lock serializes registrations of the same token
		match self.fingerprints.entry(data.fingerprint.clone()) {
			Entry::Occupied(mut entry) => {
				let id = *entry.get();
				if let Some(mut device) = self.devices.get_mut(&id) {
					if *device.user_id != *user_id {
						debug!(device_id = %id, user = %user_id, "Device moved to another user");
					}
					device.user_id = user_id.into();
					device.data = data.clone();
					return Ok(id);
				}

				// A concurrent delete removed the device but not yet its fingerprint.
				// The new id keeps the pending fingerprint removal from matching.
				let new_id = Self::next_id(&self.next_device_id);
				debug!(stale_id = %id, device_id = %new_id, "Device re-registered during delete");
				self.devices.insert(new_id, Self::new_device(new_id, user_id, data));
				entry.insert(new_id);
				Ok(new_id)
			}
			Entry::Vacant(entry) => {
				let id = Self::next_id(&self.next_device_id);
				self.devices.insert(id, Self::new_device(id, user_id, data));
				entry.insert(id);
				Ok(id)
			}
		}
	}

	async fn read_device(&self, id: DeviceId) -> ClResult<Device> {
		self.devices.get(&id).map(|d| d.clone()).ok_or(Error::NotFound)
	}

	async fn list_devices(&self) -> ClResult<Vec<Device>> {
		let mut devices: Vec<Device> = self.devices.iter().map(|d| d.clone()).collect();
		devices.sort_by_key(|d| d.id);
		Ok(devices)
	}

	async fn delete_device(&self, id: DeviceId) -> ClResult<()> {
		let (_, device) = self.devices.remove(&id).ok_or(Error::NotFound)?;
		self.fingerprints.remove_if(&device.data.fingerprint, |_, owner| *owner == id);
		Ok(())
	}

	async fn record_notification(&self, record: &NotificationRecord) -> ClResult<u64> {
		let id = Self::next_id(&self.next_notification_id);
		self.notifications.insert(id, Notification { id, record: record.clone() });
		if id > self.notification_limit {
			self.notifications.remove(&(id - self.notification_limit));
		}
		Ok(id)
	}

	async fn list_notifications(&self, limit: usize) -> ClResult<Vec<Notification>> {
		let mut notifications: Vec<Notification> =
			self.notifications.iter().map(|n| n.clone()).collect();
		notifications.sort_by(|a, b| b.id.cmp(&a.id));
		notifications.truncate(limit);
		Ok(notifications)
	}
}


// vim: ts=4
