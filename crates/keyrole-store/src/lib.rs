//! # keyrole store
//!
//! Persistence for per-server configuration records.
//!
//! Every backend implements [`ConfigStore`]: `get` returns an empty record
//! for servers that were never written, and `set` merges a [`ConfigPatch`]
//! into the stored record (upsert). One backend is chosen per deployment by
//! [`connect`], which falls back to a no-op [`DisabledStore`] when the
//! configured backend cannot be reached.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod record;
pub mod store;

pub use backend::{DisabledStore, JsonFileStore, MemoryStore};
#[cfg(feature = "mongo")]
pub use backend::MongoStore;
#[cfg(feature = "postgres")]
pub use backend::PostgresStore;
pub use record::*;
pub use store::*;
