use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("dataset unavailable: {0}")]
    DataUnavailable(String),
    #[error("mean requested over an empty row set")]
    EmptyAggregation,
    #[error("unknown filter dimension: {0}")]
    InvalidDimension(String),
    #[error("no projects in the filtered set")]
    EmptyDataset,
}
