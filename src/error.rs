use std::collections::TryReserveError;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum KdIndexError {
    /// A runtime rank of zero was supplied.
    #[error("rank must be at least 1")]
    InvalidRank,
    /// Node storage could not be grown; the tree is unchanged.
    #[error("node allocation failed: {0}")]
    AllocFailed(#[from] TryReserveError),
}

pub type Result<T> = std::result::Result<T, KdIndexError>;
