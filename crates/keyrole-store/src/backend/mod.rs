//! Storage backends for [`ConfigStore`](crate::ConfigStore).

mod disabled;
mod file;
mod memory;
#[cfg(feature = "mongo")]
mod mongo;
#[cfg(feature = "postgres")]
mod postgres;

pub use disabled::DisabledStore;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
#[cfg(feature = "mongo")]
pub use mongo::{config_from_document, patch_to_document, MongoStore};
#[cfg(feature = "postgres")]
pub use postgres::{build_upsert_sql, create_table_sql, PostgresStore};
