use thiserror::Error;

pub type FunnelResult<T> = Result<T, FunnelError>;

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("insufficient data: {records} records with {view_items} view_item events")]
    InsufficientData { records: usize, view_items: u64 },

    #[error("dimension {dimension:?} not present in any of {records} records")]
    UnknownDimension { dimension: String, records: usize },

    #[error("cache backend unavailable: {0}")]
    CacheUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
