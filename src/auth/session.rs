//! Authentication session state machine.
//!
//! The manager owns the in-memory user profile and drives every transition:
//! explicit login, logout, the liveness check against the backend, and the
//! automatic re-login path for deployments that configure default
//! credentials. The bearer token itself lives in the shared
//! [`CredentialStore`]; the manager never holds a copy.
//!
//! All mutating operations take `&mut self`. The source runtime for this
//! layer is cooperative and single-threaded, so exclusive borrows are the
//! whole concurrency story - there is no lock and no de-duplication of
//! in-flight liveness checks.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::CredentialStore;
use crate::config::{Config, DefaultCredentials};
use crate::models::{LoginRequest, LoginResponse, SessionStatus, UserProfile};

/// Who-am-I endpoint: 200 + profile body, or 401 when the token is rejected
const LIVENESS_PATH: &str = "/api/is-logged-in";

/// Login endpoint: `{username, password}` in, `{access_token}` out
const LOGIN_PATH: &str = "/api/login";

/// Server-side token invalidation, best-effort
const LOGOUT_PATH: &str = "/api/logout";

pub struct SessionManager {
    client: ApiClient,
    store: Arc<dyn CredentialStore>,
    defaults: Option<DefaultCredentials>,
    user: Option<UserProfile>,
}

impl SessionManager {
    /// Build a manager from deployment configuration and a credential store.
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = ApiClient::new(&config.api_base_url, Arc::clone(&store))?;
        Ok(Self::with_client(client, store, config.default_credentials()))
    }

    /// Build a manager around an existing client (e.g. one with hooks).
    pub fn with_client(
        client: ApiClient,
        store: Arc<dyn CredentialStore>,
        defaults: Option<DefaultCredentials>,
    ) -> Self {
        Self {
            client,
            store,
            defaults,
            user: None,
        }
    }

    /// The authenticated profile, if the most recent liveness check accepted
    /// the stored credential.
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        if self.user.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        }
    }

    /// The client other features should use for authenticated API calls.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Check whether the backend accepts the stored credential, recovering
    /// where possible. Not a pure predicate: a rejected credential is cleared
    /// from the store, and a default-credential login is attempted when one
    /// is configured.
    ///
    /// At most one default login attempt happens per call, and the liveness
    /// re-check inside that attempt never triggers another, so a persistently
    /// rejecting backend terminates after a single retry.
    pub async fn ensure_authenticated(&mut self) -> bool {
        let err = match self.fetch_profile().await {
            Ok(()) => return true,
            Err(err) => err,
        };
        self.user = None;

        let mut attempted_default = false;
        if is_unauthorized(&err) {
            let was_default = self.store.is_default_identity();
            debug!(was_default, "Stored credential rejected, clearing it");
            if let Err(err) = self.store.clear() {
                warn!(error = %err, "Failed to clear rejected credential");
            }
            if was_default {
                attempted_default = true;
                self.try_default_login().await;
            }
        } else {
            debug!(error = %err, "Liveness check failed");
        }

        // Last resort: nothing stored and no default attempt made yet.
        if !attempted_default && self.store.token().is_none() {
            self.try_default_login().await;
        }

        self.user.is_some()
    }

    /// Attempt a login with the configured default credentials.
    ///
    /// Returns false when no defaults are configured or the attempt fails;
    /// the failure is logged and swallowed so callers can always fall back
    /// to presenting the login page.
    pub async fn try_default_login(&mut self) -> bool {
        let Some(defaults) = self.defaults.clone() else {
            debug!("No default credentials configured");
            return false;
        };

        info!(username = %defaults.username, "Attempting login with default credentials");
        match self
            .submit_login(&defaults.username, &defaults.password, true)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Failed to login with default credentials");
                false
            }
        }
    }

    /// Log in with user-supplied credentials.
    ///
    /// On failure nothing in the store changes and the error propagates so
    /// the UI can display it.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.submit_login(username, password, false).await
    }

    /// Sign out: best-effort server-side invalidation, then local teardown.
    /// Returns the destination the caller should navigate to; the navigation
    /// happens regardless of whether the logout request succeeded.
    pub async fn logout(&mut self, destination: &str) -> String {
        if let Err(err) = self.client.post_empty(LOGOUT_PATH).await {
            warn!(error = %err, "Logout request failed, clearing local session anyway");
        }
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "Failed to clear stored credential on logout");
        }
        self.user = None;
        info!(destination, "Logged out");
        destination.to_string()
    }

    /// POST credentials, persist the returned token, then re-check liveness
    /// to populate the profile. The re-check runs with the automatic retry
    /// path disabled: one rejected default login must not trigger another.
    async fn submit_login(&mut self, username: &str, password: &str, is_default: bool) -> Result<()> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .client
            .post_json(LOGIN_PATH, &request)
            .await
            .context("Login request failed")?;

        // Token first, then the flag: the flag must never be observable
        // while no credential is stored.
        self.store.set_token(&response.access_token)?;
        self.store.set_default_identity(is_default)?;
        info!(username, is_default, "Login succeeded");

        self.check_session_once().await;
        Ok(())
    }

    /// One liveness round-trip with no recovery: populate the profile on
    /// success, clear a rejected credential on 401, and stop.
    async fn check_session_once(&mut self) -> bool {
        match self.fetch_profile().await {
            Ok(()) => true,
            Err(err) => {
                self.user = None;
                if is_unauthorized(&err) {
                    debug!("Fresh credential rejected, clearing it");
                    if let Err(err) = self.store.clear() {
                        warn!(error = %err, "Failed to clear rejected credential");
                    }
                } else {
                    debug!(error = %err, "Liveness check failed");
                }
                false
            }
        }
    }

    async fn fetch_profile(&mut self) -> Result<()> {
        let profile: UserProfile = self.client.get_json(LIVENESS_PATH).await?;
        debug!(username = %profile.username, "Liveness check succeeded");
        self.user = Some(profile);
        Ok(())
    }
}

/// True iff the failure was the backend rejecting the credential (401),
/// anywhere in the error chain. Network failures and other statuses are
/// deliberately not distinguished at this layer.
fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_unauthorized)
}
