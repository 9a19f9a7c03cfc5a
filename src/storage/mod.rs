// Storage module - the set store and its value types

pub mod error;
pub mod locks;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use locks::KeyLocks;
pub use store::{SetOp, SetStore};
pub use types::{SetValue, Value};
