//! Session persistence.
//!
//! Holds the credentials and the active organization selection, mirrored to
//! durable storage one key per field.
//!
//! ## Lifecycle
//!
//! ```text
//! Process start
//!   │
//!   └─► SessionStore::load (read access / refresh / org_id)
//!
//! Login / registration
//!   │
//!   └─► set(access, refresh)        ─► persisted
//!
//! Token refresh
//!   │
//!   └─► set(access)                 ─► persisted (refresh token kept)
//!
//! Logout / failed refresh
//!   │
//!   └─► clear()                     ─► every key removed
//! ```

mod storage;
mod store;

pub use storage::*;
pub use store::*;
