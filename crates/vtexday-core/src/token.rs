//! Bearer token issuing and validation (HS256 JWT)

use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use vtexday_types::auth::{AuthCtx, Role};

/// Access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	pub sub: Box<str>,
	pub role: Role,
	/// Expiry, seconds since the epoch
	pub exp: i64,
}

/// Signing and verification keys derived from the shared secret
#[derive(Clone)]
pub struct JwtKeys {
	encoding: EncodingKey,
	decoding: DecodingKey,
}

impl JwtKeys {
	pub fn new(secret: &str) -> ClResult<Self> {
		if secret.is_empty() {
			return Err(Error::ConfigError("JWT secret must not be empty".into()));
		}
		Ok(Self {
			encoding: EncodingKey::from_secret(secret.as_bytes()),
			decoding: DecodingKey::from_secret(secret.as_bytes()),
		})
	}

	/// Issue an access token for `user_id` valid for `ttl`
	pub fn issue_token(&self, user_id: &str, role: Role, ttl: Duration) -> ClResult<String> {
		let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
		let claims = Claims { sub: user_id.into(), role, exp: Timestamp::now().add_ms(ttl_ms).as_secs() };
		encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
			warn!("JWT encode error: {:?}", e);
			Error::Internal("JWT encode error".into())
		})
	}

	/// Validate an access token and return the caller it identifies
	pub fn validate_token(&self, token: &str) -> ClResult<AuthCtx> {
		let token_data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
			.map_err(|e| {
				debug!("JWT decode error: {:?}", e);
				Error::Unauthorized
			})?;

		if token_data.claims.sub.is_empty() {
			return Err(Error::Unauthorized);
		}
		Ok(AuthCtx { user_id: token_data.claims.sub, role: token_data.claims.role })
	}
}


// vim: ts=4
