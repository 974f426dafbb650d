use crate::model::BlockId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZenusError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, ZenusError>;
