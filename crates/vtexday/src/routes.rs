//! API routes

use axum::extract::State;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::prelude::*;
use vtexday_core::app::VERSION;
use vtexday_core::middleware::{require_admin, require_auth};
use vtexday_core::rate_limit::ThrottleLayer;
use vtexday_push::handler;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
	status: &'static str,
	version: &'static str,
	tracked_subjects: usize,
}

/// GET /api/health
async fn get_health(State(app): State<App>) -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "ok",
		version: VERSION,
		tracked_subjects: app.throttle.stats().tracked_subjects,
	})
}

pub fn init(app: App) -> Router {
	let throttle = ThrottleLayer::new(app.throttle.clone(), app.opts.throttle.notify);

	// Layers run outermost first: auth, admin, throttle, handler
	let admin_router = Router::new()
		.route(
			"/api/notifications",
			post(handler::post_notification)
				.layer(throttle)
				.get(handler::list_notifications),
		)
		.route_layer(middleware::from_fn(require_admin));

	let user_router = Router::new()
		.route("/api/devices", post(handler::post_device))
		.route("/api/devices/{id}", delete(handler::delete_device));

	let protected_router = admin_router
		.merge(user_router)
		.route_layer(middleware::from_fn_with_state(app.clone(), require_auth));

	let public_router = Router::new().route("/api/health", get(get_health));

	Router::new()
		.merge(public_router)
		.merge(protected_router)
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
