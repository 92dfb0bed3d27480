use thiserror::Error;

pub type OverlayResult<T> = Result<T, OverlayError>;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
