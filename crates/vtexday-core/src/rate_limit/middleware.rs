//! Throttle Middleware
//!
//! Tower layer admitting or rejecting requests per authenticated user. Must run
//! after the auth middleware so the `Auth` extension is present.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use super::config::ThrottlePolicy;
use super::guard::ThrottleGuard;
use crate::extract::Auth;
use crate::prelude::*;

/// Throttle middleware layer
#[derive(Clone)]
pub struct ThrottleLayer {
	guard: Arc<ThrottleGuard>,
	policy: ThrottlePolicy,
}

impl ThrottleLayer {
	pub fn new(guard: Arc<ThrottleGuard>, policy: ThrottlePolicy) -> Self {
		Self { guard, policy }
	}
}

impl<S> Layer<S> for ThrottleLayer {
	type Service = ThrottleService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		ThrottleService { inner, guard: self.guard.clone(), policy: self.policy }
	}
}

/// Throttle middleware service
#[derive(Clone)]
pub struct ThrottleService<S> {
	inner: S,
	guard: Arc<ThrottleGuard>,
	policy: ThrottlePolicy,
}

impl<S> Service<Request<Body>> for ThrottleService<S>
where
	S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let guard = self.guard.clone();
		let policy = self.policy;
		let mut inner = self.inner.clone();

		Box::pin(async move {
			let subject = req.extensions().get::<Auth>().map(|Auth(ctx)| ctx.subject_id());

			let admission =
				match guard.check_and_record(subject.as_deref(), &policy, Timestamp::now()) {
					Ok(admission) => admission,
					Err(error) => return Ok(error.into_response()),
				};

			let mut response = inner.call(req).await?;
			admission.apply_headers(response.headers_mut());
			Ok(response)
		})
	}
}


// vim: ts=4
