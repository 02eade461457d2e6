//! Authentication middleware

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, Response};
use axum::middleware::Next;

use crate::extract::Auth;
use crate::prelude::*;

/// Extract the bearer token from the Authorization header
fn bearer_token(req: &Request) -> Option<&str> {
	req.headers()
		.get(header::AUTHORIZATION)
		.and_then(|h| h.to_str().ok())
		.and_then(|h| h.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|t| !t.is_empty())
}

/// Reject requests without a valid bearer token, otherwise attach `Auth`
pub async fn require_auth(
	State(app): State<App>,
	mut req: Request,
	next: Next,
) -> ClResult<Response<Body>> {
	let token = bearer_token(&req).ok_or(Error::Unauthorized)?;
	let auth = app.jwt.validate_token(token)?;

	req.extensions_mut().insert(Auth(auth));
	Ok(next.run(req).await)
}

/// Reject callers without the admin role. Must run after `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> ClResult<Response<Body>> {
	let auth = req.extensions().get::<Auth>().ok_or(Error::Unauthorized)?;
	if !auth.0.is_admin() {
		warn!(user = %auth.0.user_id, "Admin access denied");
		return Err(Error::PermissionDenied);
	}
	Ok(next.run(req).await)
}


// vim: ts=4
