//! Wire types exchanged with the backend authentication endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful response from `POST /api/login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Always "bearer" from the current backend; tolerated if absent.
    #[serde(default)]
    pub token_type: String,
}

/// The authenticated identity as returned by `GET /api/is-logged-in`.
///
/// Beyond the username this layer treats the profile as opaque: present
/// means authenticated, absent means not. Unknown backend fields are kept
/// so callers can read them without this crate chasing the backend schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Externally visible session state, derived from profile presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    Authenticated,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_profile_keeps_unknown_fields() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"username": "alice", "full_name": "Alice B", "roles": ["analyst"]}"#,
        )
        .unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.extra["full_name"], "Alice B");
        assert_eq!(profile.extra["roles"][0], "analyst");
    }

    #[test]
    fn test_login_response_tolerates_missing_token_type() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"access_token": "tok-1"}"#).unwrap();
        assert_eq!(response.access_token, "tok-1");
        assert_eq!(response.token_type, "");
    }
}
