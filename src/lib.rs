//! Client-side session and authentication layer for the PhenoPortal
//! data-analysis application.
//!
//! This crate owns the authenticated identity of the client: it acquires a
//! bearer token from the backend, persists it across restarts, attaches it to
//! every outbound API request, detects credential expiry, and recovers
//! automatically when the deployment configures a default identity.
//!
//! The pieces fit together like this:
//! - [`auth::CredentialStore`] holds the token and the default-identity flag.
//! - [`api::ApiClient`] binds a request client to the base API address and
//!   injects the stored token into every request it sends.
//! - [`auth::SessionManager`] runs the login / liveness / re-login state
//!   machine on top of both.
//! - [`guard::RouteGuard`] sits in front of page navigation and redirects
//!   unauthenticated users to the login page, preserving their destination.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;

pub use api::{ApiClient, ApiError, ResponseHook};
pub use auth::{CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionManager};
pub use config::{Config, DefaultCredentials};
pub use guard::{pending_destination, GuardDecision, RouteGuard};
pub use models::{SessionStatus, UserProfile};
