//! Persistence for the single local user's session and credentials.
//!
//! The login flow itself belongs to the host; this module only stores what it
//! produces and what every remote response refreshes.

pub mod sqlite;
pub mod store;

pub use sqlite::SqliteSessionStore;
pub use store::{InMemorySessionStore, SessionStore};
