// Failure taxonomy shared by the collection and aggregation cycles
use crate::domain::weather::TransformError;
use std::time::Duration;

/// The weather provider could not produce an observation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("provider unreachable: {0}")]
    Network(String),
    #[error("rate limited by provider")]
    RateLimited,
    #[error("unknown city: {0}")]
    NotFound(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),
}

/// A sample or summary store call failed
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0:#}")]
    Backend(#[from] anyhow::Error),
    #[error("stored record could not be decoded: {0}")]
    Decode(String),
}

/// Why a single city dropped out of a cycle
#[derive(Debug, thiserror::Error)]
pub enum EntityFailure {
    #[error("data source error: {0}")]
    DataSource(#[from] SourceError),
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}
