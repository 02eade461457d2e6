//! Request extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::prelude::*;
use vtexday_types::auth::AuthCtx;

// Auth //
//******//
/// Authenticated caller, inserted by `require_auth`
#[derive(Debug, Clone)]
pub struct Auth(pub AuthCtx);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts.extensions.get::<Auth>().cloned().ok_or(Error::Unauthorized)
	}
}

// Admin //
//*******//
/// Authenticated caller holding the admin role
#[derive(Debug, Clone)]
pub struct Admin(pub AuthCtx);

impl<S> FromRequestParts<S> for Admin
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Auth(auth) = Auth::from_request_parts(parts, state).await?;
		if !auth.is_admin() {
			warn!(user = %auth.user_id, "Admin access denied");
			return Err(Error::PermissionDenied);
		}
		Ok(Admin(auth))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::Request;
	use vtexday_types::auth::Role;

	fn parts(role: Option<Role>) -> Parts {
		let mut req = Request::get("/").body(()).unwrap();
		if let Some(role) = role {
			req.extensions_mut().insert(Auth(AuthCtx { user_id: "alice".into(), role }));
		}
		req.into_parts().0
	}

	#[tokio::test]
	async fn test_auth_missing() {
		let res = Auth::from_request_parts(&mut parts(None), &()).await;
		assert!(matches!(res, Err(Error::Unauthorized)));
	}

	#[tokio::test]
	async fn test_admin_requires_role() {
		let res = Admin::from_request_parts(&mut parts(Some(Role::User)), &()).await;
		assert!(matches!(res, Err(Error::PermissionDenied)));

		let Admin(auth) = Admin::from_request_parts(&mut parts(Some(Role::Admin)), &()).await.unwrap();
		assert_eq!(&*auth.user_id, "alice");

		let res = Admin::from_request_parts(&mut parts(None), &()).await;
		assert!(matches!(res, Err(Error::Unauthorized)));
	}
}

// vim: ts=4
