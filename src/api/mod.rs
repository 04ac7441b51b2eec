//! HTTP client module for the PhenoPortal backend API.
//!
//! This module provides the `ApiClient` used for every request the client
//! makes, authenticated or not. The client reads the bearer token from the
//! shared credential store at send time, so login state changes take effect
//! on the very next request without rebuilding anything.

pub mod client;
pub mod error;

pub use client::{ApiClient, ResponseHook};
pub use error::ApiError;
