use std::io;
use thiserror::Error;

/// Result type for echo server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or probing the echo server
///
/// Pool exhaustion on the dispatch path is fatal and never surfaces here;
/// `PoolExhausted` is only produced by [`FixedPool::try_allocate`](crate::FixedPool::try_allocate).
#[derive(Error, Debug)]
pub enum Error {
    #[error("pool {pool} exhausted ({capacity} blocks in use)")]
    PoolExhausted { pool: String, capacity: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
