//! App state type

use std::sync::Arc;

use crate::extensions::Extensions;
use crate::prelude::*;
use crate::rate_limit::{ThrottleConfig, ThrottleGuard};
use crate::token::JwtKeys;
use vtexday_types::push_adapter::PushAdapter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

pub struct AppState {
	pub opts: AppBuilderOpts,
	pub jwt: JwtKeys,
	pub throttle: Arc<ThrottleGuard>,
	pub push_adapter: Arc<dyn PushAdapter>,

	// Type-erased extension map for feature-specific state
	pub extensions: Extensions,
}

impl AppState {
	/// Get a registered extension by type. Returns error if not found.
	pub fn ext<T: Send + Sync + 'static>(&self) -> ClResult<&T> {
		self.extensions.get::<T>().ok_or_else(|| {
			Error::Internal(format!("Extension {} not registered", std::any::type_name::<T>()))
		})
	}
}

pub type App = Arc<AppState>;

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	pub jwt_secret: Box<str>,
	/// Base64 encoded 32 byte AES key for device tokens
	pub device_token_key: Option<Box<str>>,
	pub push_endpoint: Box<str>,
	pub throttle: ThrottleConfig,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".into(),
			jwt_secret: "".into(),
			device_token_key: None,
			push_endpoint: DEFAULT_PUSH_ENDPOINT.into(),
			throttle: ThrottleConfig::default(),
		}
	}
}

// vim: ts=4
