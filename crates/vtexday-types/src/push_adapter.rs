//! Adapter that stores push devices and the sent-notification log.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prelude::*;

pub type DeviceId = u64;

/// Device registration as stored. The token itself is kept encrypted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceData {
	/// Base64 AES-GCM sealed push token
	pub encrypted_token: String,
	/// SHA-256 of the plaintext token, used to deduplicate registrations
	pub fingerprint: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub platform: Option<Box<str>>,
}

#[derive(Clone, Debug)]
pub struct Device {
	pub id: DeviceId,
	pub user_id: Box<str>,
	pub data: DeviceData,
	pub created_at: Timestamp,
}

/// Summary of one notification broadcast
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
	pub title: String,
	pub body: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	pub sender: Box<str>,
	pub sent: usize,
	pub failed: usize,
	pub removed: usize,
	pub created_at: Timestamp,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	pub id: u64,
	#[serde(flatten)]
	pub record: NotificationRecord,
}

#[async_trait]
pub trait PushAdapter: Send + Sync {
	/// Register a device for a user.
	///
	/// Registering the same token again (same fingerprint) returns the
	/// existing id and moves the device to the new user.
	async fn register_device(&self, user_id: &str, data: &DeviceData) -> ClResult<DeviceId>;

	async fn read_device(&self, id: DeviceId) -> ClResult<Device>;

	async fn list_devices(&self) -> ClResult<Vec<Device>>;

	/// Returns `Error::NotFound` if the device does not exist
	async fn delete_device(&self, id: DeviceId) -> ClResult<()>;

	async fn record_notification(&self, record: &NotificationRecord) -> ClResult<u64>;

	/// Most recent notifications first
	async fn list_notifications(&self, limit: usize) -> ClResult<Vec<Notification>>;
}

// vim: ts=4
