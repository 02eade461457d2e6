//! Expo push delivery
//!
//! Messages are posted as JSON arrays of at most 100 entries. The push service
//! answers with one ticket per message, in order.

use std::sync::Arc;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::DeviceTokenCipher;
use crate::prelude::*;
use crate::sanitize::NotificationContent;
use vtexday_types::push_adapter::Device;

/// Largest batch the push service accepts in one request
pub const MAX_BATCH: usize = 100;

/// One message addressed to one device
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
	pub to: String,
	pub title: String,
	pub body: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	pub sound: &'static str,
}

impl PushMessage {
	pub fn new(to: String, content: &NotificationContent) -> Self {
		Self {
			to,
			title: content.title.clone(),
			body: content.body.clone(),
			data: content.data.clone(),
			sound: "default",
		}
	}
}

/// Result of sending a push notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushResult {
	/// Successfully sent
	Success,
	/// Device is no longer registered (should be deleted)
	DeviceGone,
	/// Temporary error (can retry)
	TemporaryError(String),
	/// Permanent error (don't retry)
	PermanentError(String),
}

#[async_trait]
pub trait PushSender: Send + Sync {
	/// Deliver a batch of at most `MAX_BATCH` messages, returning one result
	/// per message in the same order.
	async fn send_batch(&self, messages: &[PushMessage]) -> Vec<PushResult>;
}

#[derive(Debug, Deserialize)]
struct TicketResponse {
	#[serde(default)]
	data: Vec<Ticket>,
}

#[derive(Debug, Deserialize)]
struct Ticket {
	status: String,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	details: Option<TicketDetails>,
}

#[derive(Debug, Deserialize)]
struct TicketDetails {
	#[serde(default)]
	error: Option<String>,
}

impl From<Ticket> for PushResult {
	fn from(ticket: Ticket) -> Self {
		if ticket.status == "ok" {
			return PushResult::Success;
		}
		let code = ticket.details.and_then(|d| d.error).unwrap_or_default();
		let message = ticket.message.unwrap_or_else(|| code.clone());
		match code.as_str() {
			"DeviceNotRegistered" => PushResult::DeviceGone,
			"MessageRateExceeded" => PushResult::TemporaryError(message),
			_ => PushResult::PermanentError(message),
		}
	}
}

/// Map a push service response to per-message results
fn parse_tickets(status: hyper::StatusCode, body: &[u8], count: usize) -> Vec<PushResult> {
	let failure = if status.is_success() {
		match serde_json::from_slice::<TicketResponse>(body) {
			Ok(response) => {
				let mut results: Vec<PushResult> =
					response.data.into_iter().map(PushResult::from).take(count).collect();
				results.resize(
					count,
					PushResult::TemporaryError("missing ticket in push response".into()),
				);
				return results;
			}
			Err(e) => PushResult::PermanentError(format!("Invalid push response: {}", e)),
		}
	} else if status.is_server_error() || status == hyper::StatusCode::TOO_MANY_REQUESTS {
		PushResult::TemporaryError(format!("HTTP {}", status))
	} else {
		let body_str = std::str::from_utf8(body).unwrap_or("");
		PushResult::PermanentError(format!("HTTP {}: {}", status, body_str))
	};
	vec![failure; count]
}

/// Push sender posting to the Expo push API
pub struct ExpoPushSender {
	endpoint: Box<str>,
	client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl ExpoPushSender {
	pub fn new(endpoint: &str) -> ClResult<Self> {
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|e| Error::ConfigError(format!("TLS error: {}", e)))?
			.https_or_http()
			.enable_http1()
			.enable_http2()
			.build();

		let client = Client::builder(TokioExecutor::new()).build(connector);
		Ok(Self { endpoint: endpoint.into(), client })
	}
}

#[async_trait]
impl PushSender for ExpoPushSender {
	async fn send_batch(&self, messages: &[PushMessage]) -> Vec<PushResult> {
		let count = messages.len();
		let payload = match serde_json::to_vec(messages) {
			Ok(json) => json,
			Err(e) => {
				return vec![
					PushResult::PermanentError(format!("Payload serialization error: {}", e));
					count
				];
			}
		};

		let request = match hyper::Request::builder()
			.method(hyper::Method::POST)
			.uri(&*self.endpoint)
			.header("Content-Type", "application/json")
			.header("Accept", "application/json")
			.body(Full::new(Bytes::from(payload)))
		{
			Ok(req) => req,
			Err(e) => {
				return vec![PushResult::PermanentError(format!("Request build error: {}", e)); count];
			}
		};

		match self.client.request(request).await {
			Ok(response) => {
				let status = response.status();
				let body = match response.into_body().collect().await {
					Ok(body) => body.to_bytes(),
					Err(e) => {
						return vec![
							PushResult::TemporaryError(format!("Network error: {}", e));
							count
						];
					}
				};
				parse_tickets(status, &body, count)
			}
			Err(e) => vec![PushResult::TemporaryError(format!("Network error: {}", e)); count],
		}
	}
}

/// Outcome of a broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
	pub sent: usize,
	pub failed: usize,
	pub removed: usize,
}

/// Send a notification to every registered device.
///
/// Devices reported gone by the push service are deleted. Devices whose token
/// cannot be decrypted count as failed.
pub async fn send_to_all(app: &App, content: &NotificationContent) -> ClResult<DeliveryReport> {
	let cipher = app.ext::<DeviceTokenCipher>()?;
	let sender = app.ext::<Arc<dyn PushSender>>()?;
	let devices = app.push_adapter.list_devices().await?;
	let mut report = DeliveryReport::default();

	let mut targets: Vec<(&Device, PushMessage)> = Vec::with_capacity(devices.len());
	for device in &devices {
		match cipher.decrypt(&device.data.encrypted_token) {
			Ok(token) => targets.push((device, PushMessage::new(token, content))),
			Err(e) => {
				report.failed += 1;
				tracing::warn!(device_id = %device.id, error = %e, "Cannot decrypt device token");
			}
		}
	}

	for chunk in targets.chunks(MAX_BATCH) {
		let messages: Vec<PushMessage> = chunk.iter().map(|(_, msg)| msg.clone()).collect();
		let results = sender.send_batch(&messages).await;

		for (i, (device, _)) in chunk.iter().enumerate() {
			let result = results
				.get(i)
				.cloned()
				.unwrap_or_else(|| PushResult::TemporaryError("no result for message".into()));

			match result {
				PushResult::Success => {
					report.sent += 1;
					tracing::debug!(device_id = %device.id, "Push notification sent successfully");
				}
				PushResult::DeviceGone => {
					tracing::info!(device_id = %device.id, "Deleting unregistered device");
					match app.push_adapter.delete_device(device.id).await {
						Ok(()) | Err(Error::NotFound) => report.removed += 1,
						Err(e) => {
							tracing::warn!(device_id = %device.id, error = %e, "Failed to delete device");
							report.failed += 1;
						}
					}
				}
				PushResult::TemporaryError(e) => {
					report.failed += 1;
					tracing::warn!(device_id = %device.id, error = %e, "Temporary push notification error");
				}
				PushResult::PermanentError(e) => {
					report.failed += 1;
					tracing::error!(device_id = %device.id, error = %e, "Permanent push notification error");
				}
			}
		}
	}

	Ok(report)
}


// vim: ts=4
