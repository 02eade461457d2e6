//! Push notification HTTP handlers

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{fingerprint, DeviceTokenCipher};
use crate::prelude::*;
use crate::sanitize::NotificationContent;
use crate::send::send_to_all;
use vtexday_core::extract::{Admin, Auth};
use vtexday_types::push_adapter::{DeviceData, DeviceId, Notification, NotificationRecord};

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

/// Request body for registering a device
#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
	/// Expo push token, `ExponentPushToken[...]`
	pub token: String,
	pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterDeviceResponse {
	pub id: DeviceId,
}

fn is_expo_token(token: &str) -> bool {
	["ExponentPushToken[", "ExpoPushToken["].iter().any(|prefix| {
		token
			.strip_prefix(prefix)
			.and_then(|rest| rest.strip_suffix(']'))
			.is_some_and(|inner| !inner.is_empty())
	})
}

/// POST /api/devices
///
/// Registers the caller's device for broadcasts. Registering a known token
/// again returns the existing id.
pub async fn post_device(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(body): Json<RegisterDeviceRequest>,
) -> ClResult<(StatusCode, Json<RegisterDeviceResponse>)> {
	let token = body.token.trim();
	if !is_expo_token(token) {
		return Err(Error::ValidationError("invalid push token".into()));
	}

	let cipher = app.ext::<DeviceTokenCipher>()?;
	let data = DeviceData {
		encrypted_token: cipher.encrypt(token)?,
		fingerprint: fingerprint(token),
		platform: body.platform.map(|p| p.trim().into()).filter(|p: &Box<str>| !p.is_empty()),
	};

	let id = app.push_adapter.register_device(&auth.user_id, &data).await?;
	info!(user = %auth.user_id, device_id = %id, "Push device registered");

	Ok((StatusCode::CREATED, Json(RegisterDeviceResponse { id })))
}

/// DELETE /api/devices/{id}
///
/// Owners may remove their own devices, admins any device.
pub async fn delete_device(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(device_id): Path<DeviceId>,
) -> ClResult<StatusCode> {
	let device = app.push_adapter.read_device(device_id).await?;
	if device.user_id != auth.user_id && !auth.is_admin() {
		return Err(Error::PermissionDenied);
	}

	app.push_adapter.delete_device(device_id).await?;
	info!(user = %auth.user_id, device_id = %device_id, "Push device deleted");

	Ok(StatusCode::NO_CONTENT)
}

/// Request body for a broadcast
#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
	pub title: String,
	pub body: String,
	pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
	pub id: u64,
	pub sent: usize,
	pub failed: usize,
	pub removed: usize,
}

/// POST /api/notifications
///
/// Broadcasts to every registered device. Throttled per admin.
pub async fn post_notification(
	State(app): State<App>,
	Admin(auth): Admin,
	Json(body): Json<SendNotificationRequest>,
) -> ClResult<Json<SendNotificationResponse>> {
	let content = NotificationContent::new(&body.title, &body.body, body.data)?;
	let report = send_to_all(&app, &content).await?;

	let record = NotificationRecord {
		title: content.title,
		body: content.body,
		data: content.data,
		sender: auth.user_id.clone(),
		sent: report.sent,
		failed: report.failed,
		removed: report.removed,
		created_at: Timestamp::now(),
	};
	let id = app.push_adapter.record_notification(&record).await?;

	info!(
		user = %auth.user_id,
		notification_id = %id,
		sent = report.sent,
		failed = report.failed,
		removed = report.removed,
		"Notification broadcast"
	);

	Ok(Json(SendNotificationResponse {
		id,
		sent: report.sent,
		failed: report.failed,
		removed: report.removed,
	}))
}

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
	pub limit: Option<usize>,
}

/// GET /api/notifications
pub async fn list_notifications(
	State(app): State<App>,
	Admin(_auth): Admin,
	Query(query): Query<ListNotificationsQuery>,
) -> ClResult<Json<Vec<Notification>>> {
	let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
	let notifications = app.push_adapter.list_notifications(limit).await?;
	Ok(Json(notifications))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_expo_token() {
		assert!(is_expo_token("ExponentPushToken[abc123]"));
		assert!(is_expo_token("ExpoPushToken[abc123]"));
		assert!(!is_expo_token("ExponentPushToken[]"));
		assert!(!is_expo_token("ExponentPushToken[abc"));
		assert!(!is_expo_token("abc123"));
		assert!(!is_expo_token(""));
	}
}

// vim: ts=4
