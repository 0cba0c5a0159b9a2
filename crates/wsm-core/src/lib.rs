//! wsm-core - Core library for Workspace Manager
//!
//! This crate provides the client side of a multi-tenant workspace API:
//!
//! - **session**: Persisted access/refresh tokens and active organization
//! - **state**: Shared session + entity caches with organization fencing
//! - **client**: Authenticated request gateway with refresh-and-retry
//! - **auth**: Login, registration and token refresh
//! - **mutation**: Optimistic update state machine
//! - **view**: Pure projection of state into a display model
//! - **workspace**: Controller tying the above to a presenter

#[cfg(feature = "client")]
pub mod auth;
#[cfg(feature = "client")]
pub mod client;
pub mod error;
pub mod mutation;
pub mod session;
pub mod state;
pub mod types;
pub mod view;
#[cfg(feature = "client")]
pub mod workspace;

// Re-export commonly used types
#[cfg(feature = "client")]
pub use client::ApiGateway;
pub use error::{Error, Result};
pub use mutation::MutationOutcome;
pub use state::{AppState, Snapshot};
pub use view::{Presenter, View};
#[cfg(feature = "client")]
pub use workspace::Workspace;
