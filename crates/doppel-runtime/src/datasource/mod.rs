//! Data source implementations

pub mod directory;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use directory::DirectorySource;
pub use memory::MemorySource;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSource;
