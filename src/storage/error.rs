use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
