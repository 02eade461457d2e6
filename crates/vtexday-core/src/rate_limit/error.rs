//! Throttle Error Types

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Reasons an action is not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleError {
	/// The subject used up its quota for the current window
	RateLimitExceeded {
		/// Whole seconds until the window resets (rounded up)
		retry_after_secs: u64,
	},
	/// No authenticated subject to account the action to
	MissingSubjectIdentifier,
}

impl std::fmt::Display for ThrottleError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ThrottleError::RateLimitExceeded { retry_after_secs } => {
				write!(f, "Rate limit exceeded, retry in {} seconds", retry_after_secs)
			}
			ThrottleError::MissingSubjectIdentifier => {
				write!(f, "Cannot throttle an action without an authenticated subject")
			}
		}
	}
}

impl std::error::Error for ThrottleError {}

impl IntoResponse for ThrottleError {
	fn into_response(self) -> Response {
		match self {
			ThrottleError::RateLimitExceeded { retry_after_secs } => {
				let body = serde_json::json!({
					"error": {
						"code": "E-RATE-LIMITED",
						"message": format!(
							"Too many requests. Try again in {} seconds.",
							retry_after_secs
						),
						"details": {
							"retryAfter": retry_after_secs
						}
					}
				});

				let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
				response
					.headers_mut()
					.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
				response
			}
			ThrottleError::MissingSubjectIdentifier => {
				let body = serde_json::json!({
					"error": {
						"code": "E-UNAUTHORIZED",
						"message": "Authentication required"
					}
				});
				(StatusCode::UNAUTHORIZED, Json(body)).into_response()
			}
		}
	}
}


// vim: ts=4
