//! App builder - constructs and runs the notification service

use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;
use crate::routes;
pub use vtexday_core::app::{App, AppBuilderOpts, AppState, VERSION};
use vtexday_core::extensions::Extensions;
use vtexday_core::rate_limit::{
	ReaperHandle, ThrottleGuard, ThrottlePolicy, ThrottleReaper, ThrottleStore,
};
use vtexday_core::token::JwtKeys;
use vtexday_push::{DeviceTokenCipher, ExpoPushSender, PushSender};
use vtexday_types::push_adapter::PushAdapter;

pub struct AppBuilder {
	opts: AppBuilderOpts,
	push_adapter: Option<Arc<dyn PushAdapter>>,
	push_sender: Option<Arc<dyn PushSender>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		// A subscriber may already be installed when several apps share a process
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder { opts: AppBuilderOpts::default(), push_adapter: None, push_sender: None }
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}

	pub fn jwt_secret(&mut self, jwt_secret: impl Into<Box<str>>) -> &mut Self {
		self.opts.jwt_secret = jwt_secret.into();
		self
	}

	pub fn device_token_key(&mut self, key: impl Into<Box<str>>) -> &mut Self {
		self.opts.device_token_key = Some(key.into());
		self
	}

	pub fn push_endpoint(&mut self, endpoint: impl Into<Box<str>>) -> &mut Self {
		self.opts.push_endpoint = endpoint.into();
		self
	}

	pub fn notify_policy(&mut self, policy: ThrottlePolicy) -> &mut Self {
		self.opts.throttle.notify = policy;
		self
	}

	pub fn sweep_interval(&mut self, interval: Duration) -> &mut Self {
		self.opts.throttle.sweep_interval = interval;
		self
	}

	// Adapters
	pub fn push_adapter(&mut self, push_adapter: Arc<dyn PushAdapter>) -> &mut Self {
		self.push_adapter = Some(push_adapter);
		self
	}

	/// Override the delivery backend (the Expo client is used otherwise)
	pub fn push_sender(&mut self, push_sender: Arc<dyn PushSender>) -> &mut Self {
		self.push_sender = Some(push_sender);
		self
	}

	/// Assemble the application state without starting any task
	pub fn build(self) -> ClResult<App> {
		let Some(push_adapter) = self.push_adapter else {
			error!("FATAL: No push adapter configured");
			return Err(Error::ConfigError("No push adapter configured".to_string()));
		};
		let jwt = JwtKeys::new(&self.opts.jwt_secret)?;

		let cipher = match &self.opts.device_token_key {
			Some(key) => DeviceTokenCipher::from_base64_key(key)?,
			None => {
				warn!("No device token key configured, using an ephemeral key");
				warn!("Registered devices will be unreadable after a restart");
				DeviceTokenCipher::from_base64_key(&DeviceTokenCipher::generate_key())?
			}
		};

		let push_sender: Arc<dyn PushSender> = match self.push_sender {
			Some(sender) => sender,
			None => {
				if rustls::crypto::CryptoProvider::install_default(
					rustls::crypto::aws_lc_rs::default_provider(),
				)
				.is_err()
				{
					debug!("Crypto provider already installed");
				}
				Arc::new(ExpoPushSender::new(&self.opts.push_endpoint)?)
			}
		};

		let mut extensions = Extensions::new();
		extensions.insert(cipher);
		extensions.insert(push_sender);

		let throttle = Arc::new(ThrottleGuard::new(Arc::new(ThrottleStore::new())));

		Ok(Arc::new(AppState { opts: self.opts, jwt, throttle, push_adapter, extensions }))
	}

	pub async fn run(self) -> ClResult<()> {
		info!("VTEX DAY notification service V{}", VERSION);

		let app = self.build()?;
		let policy = app.opts.throttle.notify;
		info!(
			window_ms = policy.window_ms.get(),
			max_actions = policy.max_actions,
			"Notification throttle configured"
		);

		let reaper = ThrottleReaper::new(app.throttle.store().clone())
			.spawn(app.opts.throttle.sweep_interval);

		let router = routes::init(app.clone());
		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
		info!("Listening on HTTP {}", app.opts.listen);

		let served = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await;

		shutdown(reaper).await;
		served?;
		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => info!("Shutdown requested"),
		Err(e) => {
			error!("Failed to listen for shutdown signal: {}", e);
			std::future::pending::<()>().await;
		}
	}
}

async fn shutdown(reaper: ReaperHandle) {
	reaper.shutdown().await;
	info!("Shutdown complete");
}

// vim: ts=4
