use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use vtexday::error::{ClResult, Error};
use vtexday::rate_limit::{ThrottleConfig, ThrottlePolicy};
use vtexday::AppBuilder;
use vtexday_push_adapter_memory::PushAdapterMemory;

pub struct Config {
	pub listen: Option<String>,
	pub jwt_secret: String,
	pub device_token_key: Option<String>,
	pub push_endpoint: Option<String>,
	pub notify_policy: ThrottlePolicy,
	pub sweep_interval: Duration,
}

fn var(name: &str) -> Option<String> {
	env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> ClResult<T> {
	match var(name) {
		Some(value) => value
			.trim()
			.parse()
			.map_err(|_| Error::ConfigError(format!("{} has an invalid value: {}", name, value))),
		None => Ok(default),
	}
}

impl Config {
	fn from_env() -> ClResult<Self> {
		let defaults = ThrottleConfig::default();
		let jwt_secret =
			var("JWT_SECRET").ok_or_else(|| Error::ConfigError("JWT_SECRET is not set".into()))?;

		let notify_policy = ThrottlePolicy::new(
			parse_var("NOTIFY_WINDOW_MS", defaults.notify.window_ms.get())?,
			parse_var("NOTIFY_MAX_PER_WINDOW", defaults.notify.max_actions)?,
		)?;
		let sweep_secs = parse_var("THROTTLE_SWEEP_SECS", defaults.sweep_interval.as_secs())?;
		if sweep_secs == 0 {
			return Err(Error::ConfigError("THROTTLE_SWEEP_SECS must be positive".into()));
		}

		Ok(Config {
			listen: var("LISTEN"),
			jwt_secret,
			device_token_key: var("DEVICE_TOKEN_KEY"),
			push_endpoint: var("PUSH_ENDPOINT"),
			notify_policy,
			sweep_interval: Duration::from_secs(sweep_secs),
		})
	}
}

async fn run(mut builder: AppBuilder) -> ClResult<()> {
	let config = Config::from_env()?;

	builder
		.jwt_secret(config.jwt_secret)
		.notify_policy(config.notify_policy)
		.sweep_interval(config.sweep_interval)
		.push_adapter(Arc::new(PushAdapterMemory::new()));
	if let Some(listen) = config.listen {
		builder.listen(listen);
	}
	if let Some(key) = config.device_token_key {
		builder.device_token_key(key);
	}
	if let Some(endpoint) = config.push_endpoint {
		builder.push_endpoint(endpoint);
	}

	builder.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
	let builder = AppBuilder::new();

	match run(builder).await {
		Ok(()) => {
			info!("Bye");
			ExitCode::SUCCESS
		}
		Err(e) => {
			error!("FATAL: {}", e);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
