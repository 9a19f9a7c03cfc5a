// In-memory keyed set store with Redis set semantics

pub mod commands;
pub mod config;
pub mod storage;

// Re-export commonly used types
pub use commands::{CommandDispatcher, Reply};
pub use config::StoreConfig;
pub use storage::{SetStore, SetValue, StoreError, Value};
