use thiserror::Error;

pub type Result<T> = std::result::Result<T, CasError>;

#[derive(Debug, Error)]
pub enum CasError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("evaluation failed: {0}")]
    Evaluation(String),
    #[error("computation cancelled")]
    Cancelled,
    #[error("internal consistency violation: {0}")]
    Inconsistent(String),
}
