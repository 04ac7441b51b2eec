//! Authentication module: credential persistence and the session state machine.
//!
//! This module provides:
//! - `CredentialStore`: durable storage for the bearer token and the
//!   default-identity flag, shared by the API client and the session manager
//! - `SessionManager`: login, logout, liveness checking, and automatic
//!   re-login with configured default credentials
//!
//! No expiry timestamp is ever stored; expiry is discovered reactively when
//! the backend answers 401.

pub mod session;
pub mod store;

pub use session::SessionManager;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
