//! Authentication context

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Admin,
	User,
}

/// Authenticated caller, resolved from the bearer token
#[derive(Clone, Debug)]
pub struct AuthCtx {
	pub user_id: Box<str>,
	pub role: Role,
}

impl AuthCtx {
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}

	/// Key identifying this caller in per-user limits
	pub fn subject_id(&self) -> String {
		format!("user:{}", self.user_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_subject_id() {
		let auth = AuthCtx { user_id: "42".into(), role: Role::User };
		assert_eq!(auth.subject_id(), "user:42");
		assert!(!auth.is_admin());
	}

	#[test]
	fn test_role_serde() {
		assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
		assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
	}
}

// vim: ts=4
