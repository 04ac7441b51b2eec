//! Navigation guard for client-side page transitions.
//!
//! The guard runs before each navigation, asks the session manager whether
//! the user is authenticated, and redirects to the login page when not,
//! carrying the originally requested destination in a `redirect` query
//! parameter so the login page can send the user onward afterwards.

use tracing::debug;
use url::form_urlencoded;

use crate::auth::SessionManager;
use crate::config::Config;

/// Query parameter carrying the pending destination through the login page
pub const REDIRECT_PARAM: &str = "redirect";

/// Outcome of a guard check; plain control flow, no framework callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Navigation may continue to the requested destination.
    Proceed,
    /// Navigate to this login URL instead.
    Redirect(String),
}

pub struct RouteGuard {
    login_path: String,
    skip_auth: bool,
}

impl RouteGuard {
    pub fn new(config: &Config) -> Self {
        Self {
            login_path: config.login_path.clone(),
            skip_auth: config.skip_auth,
        }
    }

    /// Decide whether navigation to `destination` may proceed.
    ///
    /// Short-circuits without a network call when auth is globally disabled,
    /// when the destination is the login page itself, or when a profile is
    /// already held in memory. Otherwise runs the full liveness check, which
    /// may mutate session state (credential clearing, default re-login).
    pub async fn check(&self, session: &mut SessionManager, destination: &str) -> GuardDecision {
        if self.skip_auth {
            return GuardDecision::Proceed;
        }
        if destination.starts_with(&self.login_path) {
            return GuardDecision::Proceed;
        }
        if session.user().is_some() {
            return GuardDecision::Proceed;
        }

        if session.ensure_authenticated().await {
            return GuardDecision::Proceed;
        }

        debug!(destination, "Unauthenticated navigation, redirecting to login");
        GuardDecision::Redirect(self.login_redirect(destination))
    }

    /// The login URL with `destination` preserved as a query parameter.
    fn login_redirect(&self, destination: &str) -> String {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair(REDIRECT_PARAM, destination)
            .finish();
        format!("{}?{}", self.login_path, query)
    }
}

/// Extract the pending destination from a login page query string, as
/// produced by [`RouteGuard`]. Accepts the query with or without a leading
/// `?`.
pub fn pending_destination(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> RouteGuard {
        RouteGuard::new(&Config::new("https://portal.example.org"))
    }

    #[test]
    fn test_login_redirect_encodes_destination() {
        let redirect = guard().login_redirect("/datasets/42");
        assert_eq!(redirect, "/login?redirect=%2Fdatasets%2F42");
    }

    #[test]
    fn test_login_redirect_roundtrip() {
        let destination = "/results?orderBy=pValue&orderDir=asc";
        let redirect = guard().login_redirect(destination);
        let (_, query) = redirect.split_once('?').unwrap();
        assert_eq!(pending_destination(query).as_deref(), Some(destination));
    }

    #[test]
    fn test_pending_destination_accepts_leading_question_mark() {
        assert_eq!(
            pending_destination("?redirect=%2Fdatasets").as_deref(),
            Some("/datasets")
        );
    }

    #[test]
    fn test_pending_destination_absent() {
        assert_eq!(pending_destination("theme=dark"), None);
        assert_eq!(pending_destination(""), None);
    }
}
